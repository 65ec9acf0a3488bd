use std::time::{Duration, Instant};

use eframe::egui::{self, TextureHandle, TextureOptions};

use crate::{
    art::ArtImage,
    render::{RenderTarget, Transition, TransitionPair},
};

struct Buffer {
    art: Option<ArtImage>,
    texture: Option<TextureHandle>,
    angle: f32,
}

impl Buffer {
    fn empty() -> Self {
        Self {
            art: None,
            texture: None,
            angle: 0.0,
        }
    }
}

struct ActiveTransition {
    pair: TransitionPair,
    started: Instant,
}

/// egui-backed double-buffered display surface.
///
/// Keeps the current and the outgoing buffer, each with its own texture and
/// rotation angle, and animates a linear slide between them. Call
/// [`EguiScreen::paint`] once per frame; texture upload happens lazily there
/// because it needs the egui context.
pub struct EguiScreen {
    current: Buffer,
    outgoing: Buffer,
    staged_incoming_angle: f32,
    transition: Option<ActiveTransition>,
    transition_duration: Duration,
}

impl EguiScreen {
    pub fn new(transition_duration: Duration) -> Self {
        Self {
            current: Buffer::empty(),
            outgoing: Buffer::empty(),
            staged_incoming_angle: 0.0,
            transition: None,
            transition_duration,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn current_art(&self) -> Option<&ArtImage> {
        self.current.art.as_ref()
    }

    /// Draws the buffers into `rect`. Requests a repaint while a slide is
    /// still in progress.
    pub fn paint(&mut self, ui: &mut egui::Ui, rect: egui::Rect) {
        let progress = match &self.transition {
            Some(active) => {
                let elapsed = active.started.elapsed().as_secs_f32();
                let total = self.transition_duration.as_secs_f32();
                if total <= 0.0 {
                    1.0
                } else {
                    (elapsed / total).min(1.0)
                }
            }
            None => 1.0,
        };

        if progress >= 1.0 {
            if self.transition.take().is_some() {
                self.outgoing = Buffer::empty();
            }
        }

        let width = rect.width();
        if let Some(pair) = self.transition.as_ref().map(|active| active.pair) {
            let out_offset = match pair.outgoing {
                Transition::SlideOutLeft => -progress * width,
                Transition::SlideOutRight => progress * width,
                _ => 0.0,
            };
            let in_offset = match pair.incoming {
                Transition::SlideInRight => (1.0 - progress) * width,
                Transition::SlideInLeft => -(1.0 - progress) * width,
                _ => 0.0,
            };

            Self::upload(ui.ctx(), &mut self.outgoing, "album_art.outgoing");
            Self::upload(ui.ctx(), &mut self.current, "album_art.current");
            Self::draw_buffer(ui, rect, &self.outgoing, out_offset);
            Self::draw_buffer(ui, rect, &self.current, in_offset);

            ui.ctx().request_repaint();
        } else {
            Self::upload(ui.ctx(), &mut self.current, "album_art.current");
            Self::draw_buffer(ui, rect, &self.current, 0.0);
        }
    }

    fn upload(ctx: &egui::Context, buffer: &mut Buffer, name: &str) {
        if buffer.texture.is_some() {
            return;
        }
        if let Some(art) = &buffer.art {
            buffer.texture = Some(ctx.load_texture(name, art.image.clone(), TextureOptions::LINEAR));
        }
    }

    fn draw_buffer(ui: &egui::Ui, rect: egui::Rect, buffer: &Buffer, x_offset: f32) {
        let Some(texture) = &buffer.texture else {
            return;
        };

        let tex_size = texture.size_vec2();
        if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
            return;
        }

        let scale = (rect.width() / tex_size.x)
            .min(rect.height() / tex_size.y)
            .min(1.0);
        let half = tex_size * scale * 0.5;
        let center = rect.center() + egui::vec2(x_offset, 0.0);

        let radians = buffer.angle.to_radians();
        let cos_r = radians.cos();
        let sin_r = radians.sin();

        let offsets = [
            egui::Vec2::new(-half.x, -half.y),
            egui::Vec2::new(half.x, -half.y),
            egui::Vec2::new(half.x, half.y),
            egui::Vec2::new(-half.x, half.y),
        ];
        let uvs = [
            egui::Pos2::new(0.0, 0.0),
            egui::Pos2::new(1.0, 0.0),
            egui::Pos2::new(1.0, 1.0),
            egui::Pos2::new(0.0, 1.0),
        ];

        let mut mesh = egui::Mesh::with_texture(texture.id());
        for (offset, uv) in offsets.into_iter().zip(uvs) {
            let rotated = egui::Vec2::new(
                offset.x * cos_r - offset.y * sin_r,
                offset.x * sin_r + offset.y * cos_r,
            );
            mesh.vertices.push(egui::epaint::Vertex {
                pos: egui::Pos2::new(center.x + rotated.x, center.y + rotated.y),
                uv,
                color: egui::Color32::WHITE,
            });
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        ui.painter_at(rect).add(egui::Shape::mesh(mesh));
    }
}

impl RenderTarget for EguiScreen {
    fn show_incoming(&mut self, image: ArtImage, transitions: TransitionPair) {
        // Identical bytes already on screen: keep the texture, skip the
        // slide, only take the staged angle.
        let same_art = match (&image.source_hash, &self.current.art) {
            (Some(hash), Some(current)) => current.source_hash == Some(*hash),
            _ => false,
        };
        if same_art {
            self.current.angle = self.staged_incoming_angle;
            self.current.art = Some(image);
            return;
        }

        let previous = std::mem::replace(
            &mut self.current,
            Buffer {
                art: Some(image),
                texture: None,
                angle: self.staged_incoming_angle,
            },
        );

        if previous.art.is_some() && !self.transition_duration.is_zero() {
            self.outgoing = previous;
            self.transition = Some(ActiveTransition {
                pair: transitions,
                started: Instant::now(),
            });
        } else {
            self.outgoing = Buffer::empty();
            self.transition = None;
        }
    }

    fn current_angle(&self) -> f32 {
        self.current.angle
    }

    fn set_current_angle(&mut self, degrees: f32) {
        self.current.angle = degrees;
    }

    fn set_incoming_angle(&mut self, degrees: f32) {
        self.staged_incoming_angle = degrees;
    }
}
