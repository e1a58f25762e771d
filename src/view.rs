use maud::{html, Markup, PreEscaped, DOCTYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::{
    index::{ConversionState, GalleryEntry},
    window::Geometry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailView {
    Ready(String),
    /// Conversion failed; rendered as a placeholder.
    Broken,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub index: usize,
    pub serving_path: String,
    pub thumbnail: ThumbnailView,
}

impl EntryView {
    pub fn from_entry(entry: &GalleryEntry) -> Self {
        let thumbnail = match (entry.state(), entry.thumbnail()) {
            (ConversionState::Done, Some(path)) => ThumbnailView::Ready(path.to_string()),
            (ConversionState::Failed, _) => ThumbnailView::Broken,
            _ => ThumbnailView::Missing,
        };
        Self {
            index: entry.index(),
            serving_path: entry.serving_path().to_string(),
            thumbnail,
        }
    }
}

/// Masked gallery: one cell per entry, `None` outside the display window.
#[derive(Debug, Clone)]
pub struct WindowView {
    pub first_row: usize,
    pub geometry: Geometry,
    pub cells: Vec<Option<EntryView>>,
    pub debounce_rows: usize,
}

impl WindowView {
    pub fn rendered(&self) -> impl Iterator<Item = &EntryView> {
        self.cells.iter().flatten()
    }
}

/// JSON body returned to the scrolling client.
#[derive(Debug, Serialize)]
pub struct RestResponse {
    #[serde(rename = "GalleryContent")]
    pub gallery_content: String,
    #[serde(rename = "DebounceRows")]
    pub debounce_rows: usize,
}

impl From<&WindowView> for RestResponse {
    fn from(view: &WindowView) -> Self {
        Self {
            gallery_content: render_gallery_content(view),
            debounce_rows: view.debounce_rows,
        }
    }
}

/// Item size and margins in percent of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStyle {
    pub width: String,
    pub height: String,
    pub margin_vert: String,
    pub margin_horiz: String,
}

impl ItemStyle {
    pub fn for_geometry(geometry: &Geometry) -> Self {
        let rows = geometry.rows as f32;
        let cols = geometry.columns as f32;
        Self {
            width: format!("{:.2}", 99.0 / cols),
            height: format!("{:.2}", 99.0 / rows),
            margin_vert: format!("{:.2}", 1.0 / (2.0 * rows)),
            margin_horiz: format!("{:.2}", 1.0 / (2.0 * cols)),
        }
    }
}

/// Bytes escaped in URL paths. `/` stays literal so it keeps separating
/// segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Absolute URL for a serving path such as `imgs/a b.jpg`.
pub fn url_path(serving_path: &str) -> String {
    format!("/{}", utf8_percent_encode(serving_path, PATH_SEGMENT))
}

const PAGE_STYLE: &str = "
body { margin: 0; overflow: hidden; background: #111; }
.flex-container { position: absolute; top: 0; left: 0; right: 0; display: flex; flex-wrap: wrap; transition: top 0.1s; }
.flex-container.notransition { transition: none; }
.flex-item { box-sizing: border-box; display: flex; align-items: center; justify-content: center; overflow: hidden; }
.flex-item img { max-width: 100%; max-height: 100%; }
.thumb-broken { color: #c33; font-size: 3em; text-decoration: none; }
";

fn gallery_markup(view: &WindowView) -> Markup {
    let style = ItemStyle::for_geometry(&view.geometry);
    let item_style = format!(
        "width:{}vw;height:{}vh;margin:{}vh {}vw;",
        style.width, style.height, style.margin_vert, style.margin_horiz
    );

    html! {
        @for (idx, cell) in view.cells.iter().enumerate() {
            div class="flex-item" data-index=(idx) style=(item_style) {
                @if let Some(entry) = cell {
                    @match &entry.thumbnail {
                        ThumbnailView::Ready(thumb) => {
                            a href=(url_path(&entry.serving_path)) {
                                img src=(url_path(thumb)) alt=(entry.serving_path) loading="lazy";
                            }
                        }
                        ThumbnailView::Broken => {
                            a class="thumb-broken" href=(url_path(&entry.serving_path)) title="thumbnail unavailable" {
                                "\u{26a0}"
                            }
                        }
                        ThumbnailView::Missing => {
                            a class="thumb-missing" href=(url_path(&entry.serving_path)) {}
                        }
                    }
                }
            }
        }
    }
}

pub fn render_gallery_content(view: &WindowView) -> String {
    gallery_markup(view).into_string()
}

pub fn render_page(view: &WindowView) -> String {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Gallery" }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                div class="flex-container"
                    data-rows=(view.geometry.rows)
                    data-cols=(view.geometry.columns)
                    data-debounce-rows=(view.debounce_rows)
                {
                    (gallery_markup(view))
                }
                script src="/assets/main.js" {}
            }
        }
    }
    .into_string()
}
