mod app;
mod topology;
mod util;

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Topology snapshot to render (JSON, `{"nodes": [...]}`).
    #[arg(long, default_value = "topology.json")]
    topology: PathBuf,
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "toposcope",
        options,
        Box::new(move |cc| Ok(Box::new(app::ToposcopeApp::new(cc, args.topology.clone())))),
    )
}
