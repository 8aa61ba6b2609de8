//! Topology rendering.
//!
//! [`render_current`] is the on-demand entry point: it refuses to render when
//! there is no snapshot or the last scan failed, and otherwise hands the
//! topology to a [`Renderer`]. [`PngRenderer`] draws devices on a circle,
//! rasterizes the SVG with resvg and writes a PNG file.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::graph::{NodeIndex, UnGraph};
use tiny_skia::{Pixmap, Transform};

use netmap_core::{Device, Topology};

use crate::error::RenderError;
use crate::store::TopologyStore;

/// File name of the rendered graph inside the output directory.
pub const GRAPH_FILE_NAME: &str = "topology_graph.png";

/// Turns a topology into an image artifact and returns its path.
pub trait Renderer: Send + Sync {
    fn render(&self, topology: &Topology) -> Result<PathBuf, RenderError>;
}

/// Render the store's current snapshot.
///
/// Nothing stored, or a topology without devices, is [`RenderError::NoData`].
pub fn render_current(
    store: &TopologyStore,
    renderer: &dyn Renderer,
) -> Result<PathBuf, RenderError> {
    let snapshot = store.get().ok_or(RenderError::NoData)?;
    match snapshot.topology() {
        Some(topology) if topology.devices.is_empty() => Err(RenderError::NoData),
        Some(topology) => renderer.render(topology),
        None => Err(RenderError::ScanFailed(
            snapshot.error().unwrap_or_default().to_string(),
        )),
    }
}

/// Draws the topology as a PNG under a fixed output directory.
pub struct PngRenderer {
    output_dir: PathBuf,
    size: u32,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl PngRenderer {
    /// Create a renderer writing into `output_dir`. Loads system fonts once
    /// for node labels.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        tracing::debug!(faces = fontdb.len(), "Loaded fonts for graph labels");

        Self {
            output_dir: output_dir.into(),
            size: 800,
            fontdb: Arc::new(fontdb),
        }
    }

    /// Image width and height in pixels (default 800).
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(GRAPH_FILE_NAME)
    }

    fn rasterize(&self, svg: &str) -> Result<Vec<u8>, RenderError> {
        let mut opt = usvg::Options::default();
        opt.fontdb = self.fontdb.clone();
        let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

        let mut pixmap = Pixmap::new(self.size, self.size)
            .ok_or_else(|| RenderError::Raster(format!("invalid image size {}", self.size)))?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Raster(e.to_string()))
    }
}

impl Renderer for PngRenderer {
    fn render(&self, topology: &Topology) -> Result<PathBuf, RenderError> {
        let svg = topology_svg(topology, self.size);
        let png = self.rasterize(&svg)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path();
        write_replacing(&path, &png)?;

        tracing::info!(
            path = %path.display(),
            devices = topology.devices.len(),
            bytes = png.len(),
            "Topology graph rendered"
        );
        Ok(path)
    }
}

fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("png.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Build the device graph. Connections to unknown devices are skipped.
fn device_graph(topology: &Topology) -> UnGraph<&Device, ()> {
    let mut graph = UnGraph::new_undirected();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    for device in &topology.devices {
        index
            .entry(device.ip.as_str())
            .or_insert_with(|| graph.add_node(device));
    }

    for conn in &topology.connections {
        match (index.get(conn.from.as_str()), index.get(conn.to.as_str())) {
            (Some(&a), Some(&b)) => {
                graph.update_edge(a, b, ());
            }
            _ => tracing::debug!(from = %conn.from, to = %conn.to, "Skipping link to unknown device"),
        }
    }

    graph
}

/// Lay the devices out on a circle and emit an SVG document.
fn topology_svg(topology: &Topology, size: u32) -> String {
    let graph = device_graph(topology);
    let center = size as f32 / 2.0;
    let radius = if graph.node_count() > 1 { center * 0.75 } else { 0.0 };
    let count = graph.node_count().max(1) as f32;

    let position = |idx: NodeIndex| {
        let angle = TAU * idx.index() as f32 / count;
        (center + radius * angle.cos(), center + radius * angle.sin())
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    for edge in graph.edge_indices() {
        if let Some((a, b)) = graph.edge_endpoints(edge) {
            let ((x1, y1), (x2, y2)) = (position(a), position(b));
            let _ = write!(
                svg,
                r#"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="black" stroke-width="1"/>"#
            );
        }
    }

    for idx in graph.node_indices() {
        let (x, y) = position(idx);
        let label = xml_escape(graph[idx].label());
        let _ = write!(
            svg,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="14" fill="lightblue" stroke="steelblue"/><text x="{x:.1}" y="{ty:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">{label}</text>"#,
            ty = y + 28.0
        );
    }

    svg.push_str("</svg>");
    svg
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
