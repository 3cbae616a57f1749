//! IV Surface GUI
//!
//! Interactive implied volatility surface: pick a ticker, press Generate,
//! drag to rotate the mesh.

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Vec2};
use egui_plot::{Line, Plot, PlotPoints, Points, VLine};

use iv_surface::prelude::*;
use iv_surface::render::{normalise, viridis};

struct SurfaceApp {
    // Inputs
    ticker_input: String,
    rate: f64,
    min_strike: f64,
    max_strike: f64,

    // Pipeline
    pipeline: Option<SurfacePipeline<YahooClient>>,
    run: Option<SurfaceRun>,
    /// What the pipeline handed to its renderer
    surface: CapturedSurface,
    status: String,
    error: Option<String>,

    // View
    yaw: f32,
    pitch: f32,
    selected_time: usize,
}

impl Default for SurfaceApp {
    fn default() -> Self {
        let defaults = SurfaceParams::default();
        let (pipeline, error) = match YahooClient::new() {
            Ok(client) => (Some(SurfacePipeline::new(client)), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            ticker_input: defaults.ticker,
            rate: defaults.risk_free_rate,
            min_strike: defaults.strike_band.min_fraction,
            max_strike: defaults.strike_band.max_fraction,
            pipeline,
            run: None,
            surface: CapturedSurface::default(),
            status: String::new(),
            error,
            yaw: -0.8,
            pitch: 0.45,
            selected_time: 0,
        }
    }
}

impl SurfaceApp {
    fn params(&self) -> SurfaceParams {
        SurfaceParams {
            ticker: self.ticker_input.clone(),
            risk_free_rate: self.rate,
            strike_band: StrikeBand::new(self.min_strike, self.max_strike),
            ..Default::default()
        }
    }

    fn generate(&mut self) {
        let params = self.params();
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };

        self.error = None;
        self.run = None;
        self.surface = CapturedSurface::default();

        match pipeline.run(&params, &mut self.surface) {
            Ok(run) => {
                self.status = format!(
                    "{}: {} of {} contracts priced ({} interpolation)",
                    run.ticker,
                    run.defined_count(),
                    run.contracts.len(),
                    run.grid.method
                );
                self.selected_time = 0;
                self.run = Some(run);
            }
            Err(failure) => {
                self.status = format!("Halted while {}", failure.stage);
                self.error = Some(failure.message());
            }
        }
    }

    fn draw_surface(&mut self, ui: &mut egui::Ui, grid: &Grid, labels: &AxisLabels) {
        let size = Vec2::new(ui.available_width(), ui.available_height() * 0.6);
        let (response, painter) = ui.allocate_painter(size, Sense::drag());

        let delta = response.drag_delta();
        self.yaw += delta.x * 0.01;
        self.pitch = (self.pitch + delta.y * 0.01).clamp(-1.5, 1.5);

        let rect = response.rect;
        painter.rect_filled(rect, 4.0, Color32::from_gray(20));

        let (Some((t_lo, t_hi)), Some((k_lo, k_hi)), Some((v_lo, v_hi))) =
            (grid.time_range(), grid.strike_range(), grid.vol_range())
        else {
            return;
        };

        let view = View::new(self.yaw, self.pitch, rect.center(), rect.height().min(rect.width()) * 0.32);
        let to_unit = |value: f64, lo: f64, hi: f64| (normalise(value, lo, hi) * 2.0 - 1.0) as f32;
        let node = |si: usize, ti: usize| -> Option<[f32; 3]> {
            grid.value(si, ti).map(|v| {
                [
                    to_unit(grid.times[ti], t_lo, t_hi),
                    to_unit(grid.strikes[si], k_lo, k_hi),
                    to_unit(v, v_lo, v_hi) * 0.6,
                ]
            })
        };

        // Back-to-front cells
        let (n_strikes, n_times) = grid.dim();
        let mut cells: Vec<(f32, Vec<Pos2>, Color32)> = Vec::new();
        for si in 0..n_strikes.saturating_sub(1) {
            for ti in 0..n_times.saturating_sub(1) {
                let corners = [node(si, ti), node(si, ti + 1), node(si + 1, ti + 1), node(si + 1, ti)];
                if corners.iter().any(|c| c.is_none()) {
                    continue;
                }
                let corners: Vec<[f32; 3]> = corners.into_iter().flatten().collect();

                let mean_vol = [
                    grid.value(si, ti),
                    grid.value(si, ti + 1),
                    grid.value(si + 1, ti + 1),
                    grid.value(si + 1, ti),
                ]
                .iter()
                .flatten()
                .sum::<f64>()
                    / 4.0;
                let [r, g, b] = viridis(normalise(mean_vol, v_lo, v_hi));

                let depth = corners.iter().map(|c| view.depth(*c)).sum::<f32>() / 4.0;
                let points = corners.iter().map(|c| view.project(*c)).collect();
                cells.push((depth, points, Color32::from_rgb(r, g, b)));
            }
        }
        cells.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, points, fill) in cells {
            painter.add(Shape::convex_polygon(points, fill, Stroke::new(0.3, Color32::from_black_alpha(90))));
        }

        // Single-column grids have no cells; show the nodes instead
        if n_strikes < 2 || n_times < 2 {
            for si in 0..n_strikes {
                for ti in 0..n_times {
                    if let (Some(p), Some(v)) = (node(si, ti), grid.value(si, ti)) {
                        let [r, g, b] = viridis(normalise(v, v_lo, v_hi));
                        painter.circle_filled(view.project(p), 3.0, Color32::from_rgb(r, g, b));
                    }
                }
            }
        }

        // Axes from the low corner
        let origin = [-1.0, -1.0, -0.6];
        let axes = [
            ([1.0, -1.0, -0.6], &labels.x, format!("{:.1}..{:.1}", t_lo, t_hi)),
            ([-1.0, 1.0, -0.6], &labels.y, format!("{:.2}..{:.2}", k_lo, k_hi)),
            ([-1.0, -1.0, 0.6], &labels.z, format!("{:.1}%..{:.1}%", v_lo * 100.0, v_hi * 100.0)),
        ];
        for (end, title, range) in axes {
            let a = view.project(origin);
            let b = view.project(end);
            painter.line_segment([a, b], Stroke::new(1.0, Color32::GRAY));
            painter.text(
                b,
                Align2::CENTER_BOTTOM,
                format!("{} ({})", title, range),
                FontId::proportional(12.0),
                Color32::LIGHT_GRAY,
            );
        }

        draw_colorbar(&painter, rect, v_lo, v_hi);
    }

    fn draw_smile(&mut self, ui: &mut egui::Ui, grid: &Grid, spot: f64) {
        let (_, n_times) = grid.dim();
        if n_times == 0 {
            return;
        }
        self.selected_time = self.selected_time.min(n_times - 1);

        ui.horizontal(|ui| {
            ui.label("Maturity column:");
            ui.add(egui::Slider::new(&mut self.selected_time, 0..=n_times - 1));
            ui.label(format!("{:.1} weeks", grid.times[self.selected_time]));
        });

        let smile: Vec<[f64; 2]> = grid
            .smile(self.selected_time)
            .into_iter()
            .map(|(k, v)| [k, v * 100.0])
            .collect();

        Plot::new("smile_slice")
            .view_aspect(3.0)
            .x_axis_label("Strike")
            .y_axis_label("Volatility (%)")
            .legend(egui_plot::Legend::default())
            .show(ui, |plot_ui| {
                if smile.len() > 1 {
                    plot_ui.line(
                        Line::new(PlotPoints::new(smile))
                            .name("Implied Vol")
                            .color(Color32::LIGHT_BLUE)
                            .width(2.0),
                    );
                } else if !smile.is_empty() {
                    plot_ui.points(Points::new(smile).name("Implied Vol").radius(3.0));
                }

                plot_ui.vline(
                    VLine::new(spot)
                        .name("Spot")
                        .color(Color32::YELLOW)
                        .width(1.5)
                        .style(egui_plot::LineStyle::Dashed { length: 5.0 }),
                );
            });
    }
}

/// Rotation about the vertical axis, then a tilt towards the viewer
struct View {
    yaw: (f32, f32),
    pitch: (f32, f32),
    center: Pos2,
    scale: f32,
}

impl View {
    fn new(yaw: f32, pitch: f32, center: Pos2, scale: f32) -> Self {
        Self {
            yaw: yaw.sin_cos(),
            pitch: pitch.sin_cos(),
            center,
            scale,
        }
    }

    fn rotate(&self, [x, y, z]: [f32; 3]) -> [f32; 3] {
        let (sy, cy) = self.yaw;
        let (sp, cp) = self.pitch;
        let x1 = x * cy - y * sy;
        let y1 = x * sy + y * cy;
        [x1, y1 * cp - z * sp, y1 * sp + z * cp]
    }

    /// Larger is farther away
    fn depth(&self, p: [f32; 3]) -> f32 {
        self.rotate(p)[1]
    }

    fn project(&self, p: [f32; 3]) -> Pos2 {
        let [x, _, z] = self.rotate(p);
        Pos2::new(self.center.x + x * self.scale, self.center.y - z * self.scale)
    }
}

fn draw_colorbar(painter: &egui::Painter, rect: egui::Rect, lo: f64, hi: f64) {
    let steps = 32;
    let width = 14.0;
    let height = rect.height() * 0.6;
    let left = rect.right() - width - 48.0;
    let top = rect.center().y - height / 2.0;
    let step = height / steps as f32;

    for i in 0..steps {
        let t = 1.0 - i as f64 / (steps - 1) as f64;
        let [r, g, b] = viridis(t);
        let cell = egui::Rect::from_min_size(
            Pos2::new(left, top + i as f32 * step),
            Vec2::new(width, step + 0.5),
        );
        painter.rect_filled(cell, 0.0, Color32::from_rgb(r, g, b));
    }

    let font = FontId::proportional(11.0);
    painter.text(
        Pos2::new(left + width + 4.0, top),
        Align2::LEFT_CENTER,
        format!("{:.1}%", hi * 100.0),
        font.clone(),
        Color32::LIGHT_GRAY,
    );
    painter.text(
        Pos2::new(left + width + 4.0, top + height),
        Align2::LEFT_CENTER,
        format!("{:.1}%", lo * 100.0),
        font,
        Color32::LIGHT_GRAY,
    );
}

impl eframe::App for SurfaceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("IV Surface");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Ticker:");
                ui.text_edit_singleline(&mut self.ticker_input);
            });
            ui.horizontal(|ui| {
                ui.label("Risk-free rate:");
                ui.add(
                    egui::DragValue::new(&mut self.rate)
                        .speed(0.001)
                        .clamp_range(0.0..=1.0)
                        .max_decimals(4),
                );
            });

            ui.separator();
            ui.heading("Strike Range (% of spot)");
            ui.horizontal(|ui| {
                ui.label("Min:");
                ui.add(
                    egui::DragValue::new(&mut self.min_strike)
                        .speed(0.01)
                        .clamp_range(0.5..=1.9)
                        .max_decimals(2),
                );
            });
            ui.horizontal(|ui| {
                ui.label("Max:");
                ui.add(
                    egui::DragValue::new(&mut self.max_strike)
                        .speed(0.01)
                        .clamp_range(0.6..=2.0)
                        .max_decimals(2),
                );
            });

            ui.separator();
            let can_run = self.pipeline.is_some();
            if ui.add_enabled(can_run, egui::Button::new("Generate")).clicked() {
                self.generate();
            }

            if let Some(pipeline) = &self.pipeline {
                ui.label(format!("Stage: {}", pipeline.stage()));
            }
            if !self.status.is_empty() {
                ui.label(&self.status);
            }
            if let Some(error) = &self.error {
                ui.colored_label(Color32::LIGHT_RED, error);
            }

            if let Some(run) = &self.run {
                ui.separator();
                ui.label(format!("Symbol: {}", run.ticker));
                ui.label(format!("Spot: ${:.2}", run.spot));
                ui.label(format!("As of: {}", run.evaluation_date));
                if let Some(notice) = &run.notice {
                    ui.colored_label(Color32::YELLOW, notice);
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let surface = std::mem::take(&mut self.surface);
            let spot = self.run.as_ref().map(|r| r.spot);

            let (Some(grid), Some(labels), Some(title), Some(spot)) =
                (&surface.grid, &surface.labels, &surface.title, spot)
            else {
                ui.heading(SURFACE_TITLE);
                ui.label("Set the inputs and press 'Generate'");
                self.surface = surface;
                return;
            };

            ui.heading(title);
            self.draw_surface(ui, grid, labels);
            ui.separator();
            self.draw_smile(ui, grid, spot);

            self.surface = surface;
        });
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_title("Implied Volatility Surface"),
        ..Default::default()
    };

    eframe::run_native(
        "IV Surface",
        options,
        Box::new(|_cc| Box::new(SurfaceApp::default())),
    )
}
