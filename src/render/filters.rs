use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::model::DrawtextOptions;
use crate::expr::ffmpeg::TimeVar;
use crate::visibility::Visibility;

/// One overlay ready for the filter graph.
#[derive(Clone, Debug)]
pub struct OverlayLayer {
    /// What to draw.
    pub content: LayerContent,
    /// Group visibility; `None` means always visible.
    pub visibility: Option<Visibility>,
}

/// Resolved overlay content.
#[derive(Clone, Debug)]
pub enum LayerContent {
    /// `drawtext` reading its text from a file.
    Text {
        /// File holding the rendered text.
        textfile: PathBuf,
        /// Font size in pixels.
        font_size: Option<u32>,
        /// ffmpeg color spec.
        font_color: Option<String>,
        /// Font file.
        font_file: Option<PathBuf>,
        /// x position expression.
        x: String,
        /// y position expression.
        y: String,
        /// Extra raw `drawtext` options.
        extra: DrawtextOptions,
    },
    /// Looped still image, composited with `overlay`.
    Image {
        /// Image file.
        path: PathBuf,
        /// x position expression.
        x: String,
        /// y position expression.
        y: String,
    },
}

/// Filter graph plus the extra inputs it references.
///
/// Input `0` is the background; image layers are inputs `1..`, in `image_inputs` order.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterGraph {
    /// `-filter_complex` argument.
    pub graph: String,
    /// Images to add as looped inputs after the background.
    pub image_inputs: Vec<PathBuf>,
    /// Label of the final video stream.
    pub output_label: String,
}

/// Build the graph that scales the background and draws every layer on top, in order.
pub fn build_filter_graph(scale: &str, layers: &[OverlayLayer]) -> FilterGraph {
    let mut chains: Vec<String> = Vec::with_capacity(layers.len() + 1);
    let mut image_inputs = Vec::new();

    let mut cur = "base".to_owned();
    chains.push(format!("[0:v]scale={scale}[{cur}]"));

    for (i, layer) in layers.iter().enumerate() {
        let next = format!("l{i}");
        match &layer.content {
            LayerContent::Text {
                textfile,
                font_size,
                font_color,
                font_file,
                x,
                y,
                extra,
            } => {
                let mut opts = vec![format!(
                    "textfile={}",
                    quote(&textfile.to_string_lossy())
                )];
                if let Some(size) = font_size {
                    opts.push(format!("fontsize={size}"));
                }
                if let Some(color) = font_color {
                    opts.push(format!("fontcolor={}", quote(color)));
                }
                if let Some(font) = font_file {
                    opts.push(format!("fontfile={}", quote(&font.to_string_lossy())));
                }
                opts.push(format!("x={}", quote(x)));
                opts.push(format!("y={}", quote(y)));
                for (k, v) in extra.iter() {
                    opts.push(format!("{k}={}", quote(v)));
                }
                if let Some(vis) = &layer.visibility {
                    opts.push(format!("enable={}", quote(&vis.gate.to_ffmpeg(TimeVar::Lower))));
                    if let Some(alpha) = &vis.alpha {
                        opts.push(format!("alpha={}", quote(&alpha.to_ffmpeg(TimeVar::Lower))));
                    }
                }
                chains.push(format!("[{cur}]drawtext={}[{next}]", opts.join(":")));
            }
            LayerContent::Image { path, x, y } => {
                image_inputs.push(path.clone());
                let input = image_inputs.len();
                let mut src = format!("{input}:v");
                if let Some(alpha) = layer.visibility.as_ref().and_then(|v| v.alpha.as_ref()) {
                    let faded = format!("img{i}");
                    chains.push(format!(
                        "[{src}]format=rgba,geq=r='r(X,Y)':g='g(X,Y)':b='b(X,Y)':a={}[{faded}]",
                        quote(&format!(
                            "alpha(X,Y)*({})",
                            alpha.to_ffmpeg(TimeVar::Upper)
                        ))
                    ));
                    src = faded;
                }
                let mut overlay = format!("[{cur}][{src}]overlay=x={}:y={}", quote(x), quote(y));
                if let Some(vis) = &layer.visibility {
                    let _ = write!(
                        overlay,
                        ":enable={}",
                        quote(&vis.gate.to_ffmpeg(TimeVar::Lower))
                    );
                }
                overlay.push_str(":shortest=1");
                let _ = write!(overlay, "[{next}]");
                chains.push(overlay);
            }
        }
        cur = next;
    }

    FilterGraph {
        graph: chains.join(";"),
        image_inputs,
        output_label: cur,
    }
}

/// Single-quote a filter option value.
fn quote(v: &str) -> String {
    format!("'{}'", v.replace('\\', "\\\\").replace('\'', "'\\''"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/filters.rs"]
mod tests;
