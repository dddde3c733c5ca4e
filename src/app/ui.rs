use egui::{Color32, ComboBox, Context};
use std::sync::{Arc, Mutex};
use tracing::error;

use super::App;
use crate::plotting::generate_plot_async;

/// Draw the main application UI
pub fn draw_ui(app: &mut App, ctx: &Context, app_arc: Arc<Mutex<App>>) {
    egui::SidePanel::left("side_panel").show(ctx, |ui| {
        ui.heading("Data Source");
        ui.separator();

        ui.label("CSV file:");
        ui.text_edit_singleline(&mut app.data_path);

        ui.add_enabled_ui(!app.is_loading, |ui| {
            if ui.button("Load").clicked() {
                start_load(app, Arc::clone(&app_arc), ctx.clone());
            }
        });

        ui.separator();

        ui.label("Window size:");
        let mut selected = app.window_size;
        let choices = app.window_choices();
        ui.add_enabled_ui(!app.is_loading, |ui| {
            ComboBox::new("window_selector", "")
                .selected_text(format!("{} days", selected))
                .show_ui(ui, |ui| {
                    for window in choices {
                        ui.selectable_value(&mut selected, window, format!("{} days", window));
                    }
                });
        });
        if selected != app.window_size {
            app.select_window(selected);
        }
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if app.is_loading {
            ui.centered_and_justified(|ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading...");
                });
            });
            return;
        }

        if let Some(message) = &app.error_message {
            ui.colored_label(Color32::RED, format!("Error: {}", message));
            return;
        }

        ui.heading(app.chart.title.as_str());
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            match &app.plot_texture {
                Some(texture) => {
                    ui.image(texture);
                }
                None if app.is_rendering => {
                    ui.spinner();
                }
                None => {}
            }

            ui.separator();
            for line in app.summary_lines() {
                ui.label(line);
            }
        });
    });

    if app.update_needed && !app.is_rendering {
        app.update_needed = false;
        app.is_rendering = true;
        spawn_render(app, app_arc, ctx.clone());
    }

    if app.texture_stale {
        load_plot_texture(app, ctx);
    }
}

/// Read the data file in the background and hand the result to the app
pub fn start_load(app: &mut App, app_arc: Arc<Mutex<App>>, ctx: Context) {
    let load = app.begin_load();

    tokio::spawn(async move {
        let result = load.await;
        match app_arc.lock() {
            Ok(mut app) => match result {
                Ok(result) => app.update_with_result(result),
                Err(e) => {
                    error!("{}", e);
                    app.set_error(e);
                }
            },
            Err(_) => error!("failed to acquire app lock after load"),
        }
        ctx.request_repaint();
    });
}

fn spawn_render(app: &App, app_arc: Arc<Mutex<App>>, ctx: Context) {
    let points = app.points().to_vec();
    let options = app.chart.clone();

    tokio::spawn(async move {
        let rendered = generate_plot_async(points, options).await;
        match app_arc.lock() {
            Ok(mut app) => match rendered {
                Ok(png) => app.set_plot(png),
                Err(e) => {
                    error!("plotting error: {}", e);
                    app.is_rendering = false;
                }
            },
            Err(_) => error!("failed to acquire app lock after rendering"),
        }
        ctx.request_repaint();
    });
}

fn load_plot_texture(app: &mut App, ctx: &Context) {
    app.texture_stale = false;
    let Some(png) = &app.plot_png else {
        return;
    };

    match image::load_from_memory(png) {
        Ok(image) => {
            let size = [image.width() as usize, image.height() as usize];
            let pixels = image.to_rgba8();
            let pixels = pixels.as_flat_samples();
            let texture = ctx.load_texture(
                "plot_texture",
                egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()),
                egui::TextureOptions::LINEAR,
            );
            app.plot_texture = Some(texture);
        }
        Err(e) => error!("failed to decode plot image: {}", e),
    }
}
