//! Interactive 2D fluid viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the solver and implements
//! [`eframe::App`] to render the particles and obstacles and to control
//! the simulation through an egui UI.

use eframe::App;
use fluid_core::{
    config::Config,
    particle,
    shape::Shape,
    solver::FluidSolver,
    types::ShapeId,
};
use glam::Vec2;

/// Number of particles emitted per click of the emit tool.
const EMIT_COUNT: usize = 30;
/// Half extents of the jitter rectangle the emit tool scatters into.
const EMIT_EXTENTS: Vec2 = Vec2::new(30.0, 30.0);
/// Radius of circles placed by the circle tool.
const TOOL_CIRCLE_RADIUS: f32 = 60.0;
/// Half extents of boxes placed by the box tool.
const TOOL_BOX_HALF_EXTENTS: Vec2 = Vec2::new(80.0, 50.0);

/// Interaction tool selected in the toolbar.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Tool {
    /// Scatter a burst of particles at the cursor.
    EmitParticles,
    /// Place a circle obstacle.
    AddCircle,
    /// Place a box obstacle.
    AddBox,
    /// Drag an obstacle around.
    DragShape,
    /// Remove the obstacle under the cursor.
    DeleteShape,
}

/// Main application state for the interactive viewer.
///
/// Glues together the [`FluidSolver`], an editable copy of its
/// [`Config`], camera state (pan/zoom), the active [`Tool`], and the
/// eframe callbacks that draw and drive everything.
///
/// The solver is stepped with a fixed `dt` decoupled from wall-clock
/// frame time; one step per rendered frame while running.
pub struct Viewer {
    solver: FluidSolver,
    cfg: Config,

    rng: rand::rngs::ThreadRng,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    tool: Tool,
    dragged_shape: Option<ShapeId>,

    fixed_dt: f32,
    last_error: Option<String>,
}

impl Viewer {
    /// Creates a viewer with a seeded block of particles and two default
    /// obstacles inside the configured domain.
    pub fn new() -> Self {
        let cfg = Config::default();
        let mut solver = FluidSolver::new(cfg).expect("default config is valid");
        Self::seed(&mut solver);

        Self {
            solver,
            cfg,
            rng: rand::rng(),
            running: false,
            zoom: 1.0,
            pan: egui::vec2(20.0, 20.0),
            tool: Tool::EmitParticles,
            dragged_shape: None,
            fixed_dt: 1.0 / 60.0,
            last_error: None,
        }
    }

    /// Fills the solver with the initial particle block and obstacles.
    fn seed(solver: &mut FluidSolver) {
        let cfg = *solver.config();
        let spacing = 10.0;
        let cols = (cfg.particle_count as f32).sqrt().ceil();
        let origin = Vec2::new((cfg.domain.x - cols * spacing) * 0.5, 60.0);
        solver.spawn_all(particle::block(origin, cfg.particle_count, spacing));

        solver.add_circle(Vec2::new(cfg.domain.x * 0.3, cfg.domain.y * 0.75), 70.0);
        let center = Vec2::new(cfg.domain.x * 0.65, cfg.domain.y * 0.6);
        if let Ok(ramp) = Shape::polygon(vec![
            center + Vec2::new(-120.0, 40.0),
            center + Vec2::new(120.0, -40.0),
            center + Vec2::new(120.0, 40.0),
        ]) {
            solver.add_shape(ramp);
        }
    }

    /// Resets particles, springs and obstacles to the seeded state,
    /// keeping the current configuration and camera.
    fn reset(&mut self) {
        self.solver = FluidSolver::new(self.cfg).expect("config was validated on edit");
        Self::seed(&mut self.solver);
        self.dragged_shape = None;
        self.last_error = None;
        self.running = false;
    }

    /// Removes every particle, spring and obstacle.
    fn clear(&mut self) {
        self.solver.clear_particles();
        while self.solver.remove_shape(0).is_some() {}
        self.dragged_shape = None;
    }

    /// Advances the solver by one fixed step, recording any error.
    fn step_once(&mut self) {
        self.last_error = self.solver.update(self.fixed_dt).err().map(|e| e.to_string());
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World y points down, matching the screen, so the mapping is a
    /// plain scale by `zoom` plus the pan offset from the panel origin.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        egui::pos2(
            rect.min.x + p.x * self.zoom + self.pan.x,
            rect.min.y + p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        Vec2::new(
            (p.x - rect.min.x - self.pan.x) / self.zoom,
            (p.y - rect.min.y - self.pan.y) / self.zoom,
        )
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                if ui.button("Clear").clicked() {
                    self.clear();
                }

                ui.separator();
                ui.add(
                    egui::DragValue::new(&mut self.fixed_dt)
                        .prefix("dt = ")
                        .range(0.001..=0.1)
                        .speed(0.001),
                );
                ui.add(egui::Slider::new(&mut self.zoom, 0.2..=4.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (counts and the last solver error).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt = {:.4} s", self.fixed_dt));
                ui.separator();
                ui.label(format!("particles = {}", self.solver.particles().len()));
                ui.label(format!("springs = {}", self.solver.springs().len()));
                ui.label(format!("shapes = {}", self.solver.shapes().len()));
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand configuration panel for solver parameters.
    ///
    /// Edits go into the local config copy and are pushed to the solver
    /// every frame; a rejected configuration shows up in the status bar
    /// and leaves the solver on its previous one.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Neighbourhood");
                Self::labeled_drag_f32(
                    ui,
                    "interaction_radius:",
                    &mut self.cfg.interaction_radius,
                    1.0..=200.0,
                    0.5,
                );

                ui.separator();
                ui.label("Gravity");
                Self::labeled_drag_f32(ui, "x:", &mut self.cfg.gravity.x, -3000.0..=3000.0, 5.0);
                Self::labeled_drag_f32(ui, "y:", &mut self.cfg.gravity.y, -3000.0..=3000.0, 5.0);

                ui.separator();
                ui.label("Pressure");
                Self::labeled_drag_f32(
                    ui,
                    "rest_density:",
                    &mut self.cfg.rest_density,
                    0.0..=100.0,
                    0.1,
                );
                Self::labeled_drag_f32(ui, "k:", &mut self.cfg.stiffness_k, 0.0..=5000.0, 5.0);
                Self::labeled_drag_f32(
                    ui,
                    "k_near:",
                    &mut self.cfg.stiffness_k_near,
                    0.0..=20000.0,
                    10.0,
                );

                ui.separator();
                ui.label("Viscosity");
                Self::labeled_drag_f32(
                    ui,
                    "sigma:",
                    &mut self.cfg.viscosity_sigma,
                    0.0..=200.0,
                    0.5,
                );
                Self::labeled_drag_f32(ui, "beta:", &mut self.cfg.viscosity_beta, 0.0..=10.0, 0.05);

                ui.separator();
                ui.label("Springs");
                Self::labeled_drag_f32(
                    ui,
                    "yield_ratio:",
                    &mut self.cfg.plasticity_yield_ratio,
                    0.0..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "plasticity_rate:",
                    &mut self.cfg.plasticity_rate,
                    0.0..=200.0,
                    0.5,
                );
                Self::labeled_drag_f32(
                    ui,
                    "spring_stiffness:",
                    &mut self.cfg.spring_stiffness,
                    0.0..=2000.0,
                    5.0,
                );

                ui.separator();
                ui.label("Integration");
                Self::labeled_drag_f32(
                    ui,
                    "velocity_damping:",
                    &mut self.cfg.velocity_damping,
                    0.0..=1.0,
                    0.01,
                );

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }

                if let Err(e) = self.solver.set_config(self.cfg) {
                    self.last_error = Some(e.to_string());
                }
            });
    }

    /// Builds the small floating toolbar for choosing the active tool.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 100.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            for (tool, label) in [
                                (Tool::EmitParticles, "💧 Emit"),
                                (Tool::AddCircle, "○ Circle"),
                                (Tool::AddBox, "■ Box"),
                                (Tool::DragShape, "✋ Drag"),
                                (Tool::DeleteShape, "✖ Delete"),
                            ] {
                                if ui
                                    .selectable_label(self.tool == tool, label)
                                    .clicked()
                                {
                                    self.tool = tool;
                                }
                            }
                        });
                    });
            });
    }

    /// Applies the active tool at a clicked world position.
    fn apply_tool_click(&mut self, pos: Vec2) {
        match self.tool {
            Tool::EmitParticles => {
                self.solver.spawn_all(particle::random_in_rect(
                    pos - EMIT_EXTENTS,
                    EMIT_EXTENTS * 2.0,
                    EMIT_COUNT,
                    &mut self.rng,
                ));
            }
            Tool::AddCircle => {
                self.solver.add_circle(pos, TOOL_CIRCLE_RADIUS);
            }
            Tool::AddBox => {
                // A box from four corners can never be degenerate.
                let _ = self.solver.add_polygon(vec![
                    pos - TOOL_BOX_HALF_EXTENTS,
                    pos + Vec2::new(TOOL_BOX_HALF_EXTENTS.x, -TOOL_BOX_HALF_EXTENTS.y),
                    pos + TOOL_BOX_HALF_EXTENTS,
                    pos + Vec2::new(-TOOL_BOX_HALF_EXTENTS.x, TOOL_BOX_HALF_EXTENTS.y),
                ]);
            }
            Tool::DeleteShape => {
                if let Some(id) = self.solver.shape_at(pos) {
                    self.solver.remove_shape(id);
                }
            }
            Tool::DragShape => {}
        }
    }

    /// Builds the central panel where the fluid is drawn and interacted
    /// with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));

            // Pan with secondary-button drag; the primary button belongs
            // to the tools.
            if response.dragged_by(egui::PointerButton::Secondary) {
                self.pan += response.drag_delta();
            }

            // Click tools.
            if response.clicked()
                && let Some(pos) = hover_world
            {
                self.apply_tool_click(pos);
            }

            // Shape dragging.
            if self.tool == Tool::DragShape {
                if response.drag_started_by(egui::PointerButton::Primary)
                    && let Some(pos) = hover_world
                {
                    self.dragged_shape = self.solver.shape_at(pos);
                }
                if response.dragged_by(egui::PointerButton::Primary)
                    && let Some(id) = self.dragged_shape
                {
                    let delta = response.drag_delta() / self.zoom;
                    self.solver.move_shape_by(id, Vec2::new(delta.x, delta.y));
                }
                if response.drag_stopped() {
                    self.dragged_shape = None;
                }
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.2, 4.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Domain border.
            let domain = self.solver.config().domain;
            let min = self.world_to_screen(Vec2::ZERO, rect);
            let max = self.world_to_screen(domain, rect);
            painter.rect_stroke(
                egui::Rect::from_min_max(min, max),
                egui::CornerRadius::ZERO,
                egui::Stroke::new(1.0, egui::Color32::GRAY),
                egui::StrokeKind::Middle,
            );

            // Particles, tinted toward white as they speed up.
            for p in self.solver.particles() {
                let center = self.world_to_screen(p.position, rect);
                let t = (p.velocity.length() / 400.0).clamp(0.0, 1.0);
                let color = egui::Color32::from_rgb(
                    (40.0 + 215.0 * t) as u8,
                    (144.0 + 111.0 * t) as u8,
                    255,
                );
                painter.circle_filled(center, (3.0 * self.zoom).max(1.0), color);
            }

            // Obstacles.
            let stroke = egui::Stroke::new(2.0, egui::Color32::LIGHT_GREEN);
            for shape in self.solver.shapes() {
                match shape {
                    Shape::Circle { center, radius } => {
                        painter.circle_stroke(
                            self.world_to_screen(*center, rect),
                            radius * self.zoom,
                            stroke,
                        );
                    }
                    Shape::Polygon { vertices, .. } => {
                        let points: Vec<egui::Pos2> = vertices
                            .iter()
                            .map(|&v| self.world_to_screen(v, rect))
                            .collect();
                        painter.add(egui::Shape::closed_line(points, stroke));
                    }
                }
            }

            // Auto-run: one fixed step per rendered frame.
            if self.running {
                self.step_once();
                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new();
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(-3.5, 8.25),
        ];

        let eps = 1e-4;
        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);
            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn new_seeds_particles_and_obstacles() {
        let viewer = Viewer::new();
        assert_eq!(
            viewer.solver.particles().len(),
            viewer.cfg.particle_count
        );
        assert_eq!(viewer.solver.shapes().len(), 2);
    }

    #[test]
    fn reset_restores_seeded_state() {
        let mut viewer = Viewer::new();

        viewer.solver.clear_particles();
        viewer.apply_tool_click(Vec2::new(300.0, 300.0)); // emits particles
        viewer.running = true;
        viewer.last_error = Some("stale".into());

        viewer.reset();

        assert_eq!(
            viewer.solver.particles().len(),
            viewer.cfg.particle_count
        );
        assert_eq!(viewer.solver.shapes().len(), 2);
        assert!(!viewer.running);
        assert!(viewer.last_error.is_none());
    }

    #[test]
    fn clear_removes_particles_and_shapes() {
        let mut viewer = Viewer::new();
        viewer.clear();
        assert!(viewer.solver.particles().is_empty());
        assert!(viewer.solver.shapes().is_empty());
        assert_eq!(viewer.solver.springs().len(), 0);
    }

    #[test]
    fn emit_tool_scatters_particles_around_the_cursor() {
        let mut viewer = Viewer::new();
        viewer.clear();
        viewer.tool = Tool::EmitParticles;

        let target = Vec2::new(400.0, 200.0);
        viewer.apply_tool_click(target);

        assert_eq!(viewer.solver.particles().len(), EMIT_COUNT);
        for p in viewer.solver.particles() {
            assert!((p.position - target).abs().max_element() <= EMIT_EXTENTS.x + 1e-3);
        }
    }

    #[test]
    fn delete_tool_removes_the_shape_under_the_cursor() {
        let mut viewer = Viewer::new();
        viewer.clear();
        viewer.tool = Tool::AddCircle;
        viewer.apply_tool_click(Vec2::new(300.0, 300.0));
        assert_eq!(viewer.solver.shapes().len(), 1);

        viewer.tool = Tool::DeleteShape;
        viewer.apply_tool_click(Vec2::new(310.0, 300.0));
        assert!(viewer.solver.shapes().is_empty());
    }

    #[test]
    fn step_once_advances_without_error() {
        let mut viewer = Viewer::new();
        viewer.step_once();
        assert!(viewer.last_error.is_none());

        // A broken dt is surfaced instead of panicking.
        viewer.fixed_dt = 0.0;
        viewer.step_once();
        assert!(viewer.last_error.is_some());
    }
}
