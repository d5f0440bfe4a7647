use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Align, Context, Layout, Rect, vec2};

use crate::topology::Topology;

mod grid;
mod label;
mod node_view;
mod precision;
mod render_utils;
mod shape;
mod viewport;

use grid::SquareGrid;
use node_view::ActionDispatcher;
use precision::layout_precision;
use render_utils::HueColorMapper;
use viewport::{ScreenResizeSource, TopologyViewport};

pub struct ToposcopeApp {
    topology_path: PathBuf,
    state: AppState,
    reload_rx: Option<Receiver<Result<Topology, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Topology, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    topology: Topology,
    viewport: TopologyViewport,
    resize: ScreenResizeSource,
    store: ActionStore,
}

/// The action-store stand-in: interaction notifications land here and drive
/// selection and hover view state for the next frame.
#[derive(Default)]
struct ActionStore {
    selected: Option<SelectedNode>,
    hovered_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
struct SelectedNode {
    id: String,
    label: String,
    anchor: Rect,
}

impl ActionDispatcher for ActionStore {
    fn click_node(&mut self, id: &str, label: &str, bounds: Rect) {
        log::debug!("clicked node {id} at {bounds:?}");
        self.selected = Some(SelectedNode {
            id: id.to_owned(),
            label: label.to_owned(),
            anchor: bounds,
        });
    }

    fn enter_node(&mut self, id: &str) {
        log::trace!("pointer entered node {id}");
        self.hovered_id = Some(id.to_owned());
    }

    fn leave_node(&mut self, id: &str) {
        log::trace!("pointer left node {id}");
        if self.hovered_id.as_deref() == Some(id) {
            self.hovered_id = None;
        }
    }
}

impl ToposcopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, topology_path: PathBuf) -> Self {
        let state = Self::start_load(topology_path.clone());
        Self {
            topology_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(topology_path: PathBuf) -> Receiver<Result<Topology, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result =
                Topology::load(&topology_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(topology_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(topology_path),
        }
    }

    fn ready_model(topology: Topology, ctx: &Context) -> AppState {
        log::info!("topology snapshot loaded: {} nodes", topology.len());
        let mut model = ViewModel {
            topology,
            viewport: TopologyViewport::new(Box::new(SquareGrid::new())),
            resize: ScreenResizeSource::new(ctx),
            store: ActionStore::default(),
        };
        model.viewport.mount(&mut model.resize);
        AppState::Ready(Box::new(model))
    }
}

impl eframe::App for ToposcopeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(match result {
                        Ok(topology) => Self::ready_model(topology, ctx),
                        Err(error) => AppState::Error(error),
                    });
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading topology snapshot...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load topology snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.topology_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.topology_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.topology_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(match result {
                                Ok(topology) => Self::ready_model(topology, ctx),
                                Err(error) => AppState::Error(error),
                            });
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background snapshot loader disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            // the outgoing viewport must release its resize subscription
            if let AppState::Ready(model) = &mut self.state {
                let ViewModel {
                    viewport, resize, ..
                } = model.as_mut();
                viewport.unmount(resize);
            }
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn show(
        &mut self,
        ctx: &Context,
        topology_path: &std::path::Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.resize.refresh(ctx);
        self.viewport.poll_resize(&mut self.resize);

        // selection that no longer matches a live node is dropped
        if let Some(selected) = &self.store.selected
            && !self.topology.contains(&selected.id)
        {
            self.store.selected = None;
        }
        let selected_id = self.store.selected.as_ref().map(|entry| entry.id.clone());
        self.apply_view_flags(selected_id.as_deref());

        let dimensions = self.viewport.dimensions();
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("toposcope");
                    ui.separator();
                    ui.label(format!("snapshot: {}", topology_path.display()));
                    ui.label(format!("nodes: {}", self.topology.len()));
                    ui.label(format!(
                        "precision: {}",
                        layout_precision(self.topology.len())
                    ));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "viewport: {:.0}x{:.0} @ {:.2}x",
                            dimensions.width,
                            dimensions.height,
                            self.viewport.zoom()
                        ));
                    });
                });
            });

        let mut background_clicked = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = self.viewport.show(
                ui,
                &mut self.topology,
                selected_id.as_deref(),
                &HueColorMapper,
                &mut self.store,
            );
            background_clicked = response.background_clicked;
        });

        if background_clicked {
            self.store.selected = None;
        }

        self.show_detail_popover(ctx);
    }

    fn apply_view_flags(&mut self, selected_id: Option<&str>) {
        let has_selected = TopologyViewport::has_selected_node(&self.topology, selected_id);
        let hovered_id = self.store.hovered_id.clone();

        for node in self.topology.nodes_mut() {
            node.focused = selected_id == Some(node.id.as_str());
            node.blurred = has_selected && !node.focused;
            node.highlighted =
                node.focused || hovered_id.as_deref() == Some(node.id.as_str());
        }
    }

    /// Detail popover anchored at the bounding rect delivered by `click_node`.
    fn show_detail_popover(&mut self, ctx: &Context) {
        let Some(selected) = self.store.selected.clone() else {
            return;
        };
        let Some(node) = self.topology.get(&selected.id) else {
            return;
        };

        let mut dismissed = false;
        egui::Area::new(egui::Id::new("node_detail"))
            .fixed_pos(selected.anchor.right_top() + vec2(14.0, 0.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.strong(&node.label);
                    if !node.sub_label.is_empty() {
                        ui.label(&node.sub_label);
                    }
                    ui.separator();
                    ui.label(format!("id: {}", node.id));
                    ui.label(format!("shape: {}{}", node.shape, if node.stack { " (stack)" } else { "" }));
                    if let Some(rank) = &node.rank {
                        ui.label(format!("rank: {rank}"));
                    }
                    if node.pseudo {
                        ui.label("pseudo node");
                    }
                    if ui.button("Close").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.store.selected = None;
        }
    }
}
