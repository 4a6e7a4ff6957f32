// src/scores/plot.rs

//! Minimal raster bar chart for registered scores.
//!
//! Text is drawn from the `font8x8` glyph table: the title at double size,
//! the axis labels, the y tick values and one model name under each bar.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use tracing::debug;

use super::{ScoreEntry, TESTING_SUFFIX, TRAINING_SUFFIX};
use crate::errors::Result;

pub const TITLE: &str = "Model scores on Test data set";
pub const X_LABEL: &str = "Model Names";
pub const Y_LABEL: &str = "Model scores";

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const LEFT: u32 = 72;
const RIGHT: u32 = 24;
const TOP: u32 = 48;
const BOTTOM: u32 = 64;
const GLYPH: u32 = 8;

const BACKGROUND: Rgb<u8> = Rgb([250, 250, 250]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const BAR: Rgb<u8> = Rgb([31, 119, 180]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

/// Render `entries` as a PNG bar chart, one bar per entry in the given order.
///
/// Bars are scaled against `max(1.0, largest value)`; negative and NaN
/// values draw as empty bars. Each bar is labelled with its metric name,
/// minus the training/testing suffix.
pub fn render_bar_chart(title: &str, entries: &[ScoreEntry]) -> Result<Vec<u8>> {
    let img = draw_chart(title, entries);

    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(img.as_raw(), WIDTH, HEIGHT, ExtendedColorType::Rgb8)?;

    debug!(title, bars = entries.len(), bytes = out.len(), "rendered score chart");
    Ok(out)
}

fn draw_chart(title: &str, entries: &[ScoreEntry]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let left = LEFT;
    let right = WIDTH - RIGHT;
    let top = TOP;
    let bottom = HEIGHT - BOTTOM;
    let plot_height = bottom - top;

    let scale = entries
        .iter()
        .map(|e| e.value)
        .filter(|v| v.is_finite())
        .fold(1.0_f64, f64::max);

    // Horizontal grid and tick values at quarters of the scale.
    for quarter in 0..=4 {
        let y = bottom - plot_height * quarter / 4;
        if quarter > 0 {
            hline(&mut img, left, right, y, GRID);
        }
        let tick = format!("{:.2}", scale * f64::from(quarter) / 4.0);
        let x = left.saturating_sub(4 + text_width(&tick, 1));
        draw_text(&mut img, x, y.saturating_sub(GLYPH / 2), &tick, 1, TEXT);
    }

    if !entries.is_empty() {
        let slot = ((right - left) / entries.len() as u32).max(1);
        let bar_width = (slot * 3 / 5).max(1);
        let max_chars = (slot / GLYPH).max(1) as usize;

        for (i, entry) in entries.iter().enumerate() {
            let fraction = if entry.value.is_finite() && entry.value > 0.0 {
                (entry.value / scale).min(1.0)
            } else {
                0.0
            };
            let bar_height = (fraction * f64::from(plot_height)).round() as u32;
            let x0 = left + slot * i as u32 + (slot - bar_width) / 2;
            if x0 + bar_width > right {
                break;
            }
            fill_rect(&mut img, x0, bottom - bar_height, bar_width, bar_height, BAR);

            let label: String = bar_label(&entry.name).chars().take(max_chars).collect();
            let centre = x0 + bar_width / 2;
            let x = centre.saturating_sub(text_width(&label, 1) / 2);
            draw_text(&mut img, x, bottom + GLYPH, &label, 1, TEXT);
        }
    }

    hline(&mut img, left, right, bottom, AXIS);
    vline(&mut img, left, top, bottom, AXIS);

    let title_x = (WIDTH.saturating_sub(text_width(title, 2))) / 2;
    draw_text(&mut img, title_x, 12, title, 2, TEXT);

    let x_label_x = ((left + right) / 2).saturating_sub(text_width(X_LABEL, 1) / 2);
    draw_text(&mut img, x_label_x, HEIGHT - 20, X_LABEL, 1, TEXT);

    let y_label_base = top + plot_height / 2 + text_width(Y_LABEL, 1) / 2;
    draw_text_up(&mut img, 10, y_label_base, Y_LABEL, TEXT);

    img
}

/// Metric name shown under a bar: the model name when the metric carries a
/// phase suffix.
fn bar_label(name: &str) -> &str {
    name.strip_suffix(TESTING_SUFFIX)
        .or_else(|| name.strip_suffix(TRAINING_SUFFIX))
        .unwrap_or(name)
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH * scale
}

/// Left to right from the top-left corner `(x, y)`, each glyph pixel drawn
/// as a `scale` x `scale` block.
fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin = x + i as u32 * GLYPH * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                let px = origin + col * scale;
                let py = y + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put(img, px + dx, py + dy, color);
                    }
                }
            }
        }
    }
}

/// Bottom to top, starting at `(x, y_base)`, glyph tops facing left.
fn draw_text_up(img: &mut RgbImage, x: u32, y_base: u32, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                if let Some(py) = y_base.checked_sub(i as u32 * GLYPH + col) {
                    put(img, x + row as u32, py, color);
                }
            }
        }
    }
}

fn put(img: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

fn hline(img: &mut RgbImage, x0: u32, x1: u32, y: u32, color: Rgb<u8>) {
    for x in x0..=x1 {
        img.put_pixel(x, y, color);
    }
}

fn vline(img: &mut RgbImage, x: u32, y0: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..=y1 {
        img.put_pixel(x, y, color);
    }
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, color);
        }
    }
}
