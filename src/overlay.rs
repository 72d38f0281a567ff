//! Full-screen selection overlay (eframe/egui).
//!
//! Shows the screenshot as a borderless full-screen background, feeds pointer
//! events into a [`RegionSelection`] and outlines the rectangle while the
//! user drags. The window closes itself on release or `Escape`.
//!
//! `run_native` is called with the default `run_and_return = true`, so eframe
//! keeps its winit event loop in a thread-local and the overlay can be opened
//! several times in one process (one per graph).

use crate::error::ReportError;
use crate::geometry::CaptureRect;
use crate::selector::RegionSelection;
use eframe::egui;
use image::RgbaImage;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const OUTLINE_WIDTH: f32 = 2.0;

/// Block on the overlay until the selection closes.
pub(crate) fn run_overlay(screenshot: &RgbaImage) -> Result<CaptureRect, ReportError> {
    let selection = Arc::new(Mutex::new(RegionSelection::new()));
    let size = [screenshot.width() as usize, screenshot.height() as usize];
    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, screenshot.as_raw());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Select a region")
            .with_decorations(false)
            .with_fullscreen(true)
            .with_window_level(egui::WindowLevel::AlwaysOnTop),
        ..Default::default()
    };

    info!(
        "Opening selection overlay over {}x{} screenshot",
        screenshot.width(),
        screenshot.height()
    );

    let shared = Arc::clone(&selection);
    eframe::run_native(
        "graph2docx",
        options,
        Box::new(move |cc| Ok(Box::new(OverlayApp::new(cc, pixels, shared)))),
    )
    .map_err(|e| ReportError::Overlay(e.to_string()))?;

    let selection = selection
        .lock()
        .map_err(|_| ReportError::Internal("selection state poisoned".into()))?
        .clone();
    selection.finish()
}

struct OverlayApp {
    texture: egui::TextureHandle,
    image_size: egui::Vec2,
    selection: Arc<Mutex<RegionSelection>>,
}

impl OverlayApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        pixels: egui::ColorImage,
        selection: Arc<Mutex<RegionSelection>>,
    ) -> Self {
        let image_size = egui::vec2(pixels.size[0] as f32, pixels.size[1] as f32);
        let texture = cc
            .egui_ctx
            .load_texture("screenshot", pixels, egui::TextureOptions::LINEAR);
        Self {
            texture,
            image_size,
            selection,
        }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_cursor_icon(egui::CursorIcon::Crosshair);

        let (pressed, released, pointer, escape) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.key_pressed(egui::Key::Escape),
            )
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let screen = ui.max_rect();
                let painter = ui.painter();
                painter.image(
                    self.texture.id(),
                    screen,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );

                let Ok(mut selection) = self.selection.lock() else {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    return;
                };

                if escape {
                    debug!("Selection cancelled with Escape");
                    selection.cancel();
                }
                if let Some(pos) = pointer {
                    let (x, y) = to_image(pos, screen, self.image_size);
                    // press, move and release can all land in one frame on a quick click
                    if pressed {
                        selection.press(x, y);
                    }
                    selection.move_to(x, y);
                    if released {
                        selection.release(x, y);
                    }
                }

                if let Some(rect) = selection.current_rect() {
                    painter.rect_stroke(
                        to_screen(rect, screen, self.image_size),
                        0.0,
                        egui::Stroke::new(OUTLINE_WIDTH, egui::Color32::RED),
                    );
                }

                if selection.is_closed() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
    }
}

/// Map a pointer position (UI points) to screenshot pixels.
fn to_image(pos: egui::Pos2, screen: egui::Rect, image_size: egui::Vec2) -> (i32, i32) {
    let fx = ((pos.x - screen.min.x) / screen.width().max(1.0)).clamp(0.0, 1.0);
    let fy = ((pos.y - screen.min.y) / screen.height().max(1.0)).clamp(0.0, 1.0);
    (
        (fx * image_size.x).round() as i32,
        (fy * image_size.y).round() as i32,
    )
}

/// Map a screenshot-pixel rectangle back to UI points for drawing.
fn to_screen(rect: CaptureRect, screen: egui::Rect, image_size: egui::Vec2) -> egui::Rect {
    let sx = screen.width() / image_size.x.max(1.0);
    let sy = screen.height() / image_size.y.max(1.0);
    egui::Rect::from_min_size(
        egui::pos2(
            screen.min.x + rect.x as f32 * sx,
            screen.min.y + rect.y as f32 * sy,
        ),
        egui::vec2(rect.width as f32 * sx, rect.height as f32 * sy),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_maps_through_scaling() {
        // 1920x1080 screenshot shown on a 960x540-point surface (2x HiDPI)
        let screen = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(960.0, 540.0));
        let image = egui::vec2(1920.0, 1080.0);
        assert_eq!(to_image(egui::pos2(480.0, 270.0), screen, image), (960, 540));
        // positions outside the surface clamp to the image edge
        assert_eq!(to_image(egui::pos2(-5.0, 600.0), screen, image), (0, 1080));
    }

    #[test]
    fn rect_round_trips_to_screen() {
        let screen = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(960.0, 540.0));
        let image = egui::vec2(1920.0, 1080.0);
        let r = to_screen(CaptureRect::new(200, 100, 400, 300), screen, image);
        assert_eq!(r.min, egui::pos2(100.0, 50.0));
        assert_eq!(r.size(), egui::vec2(200.0, 150.0));
    }
}
