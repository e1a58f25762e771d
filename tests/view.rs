use thumbgallery::view::*;
use thumbgallery::window::Geometry;

fn view(cells: Vec<Option<EntryView>>) -> WindowView {
    let geometry = Geometry::new(3, 3, 3);
    WindowView {
        first_row: 0,
        geometry,
        cells,
        debounce_rows: geometry.debounce_rows(),
    }
}

fn entry(index: usize, thumbnail: ThumbnailView) -> Option<EntryView> {
    Some(EntryView {
        index,
        serving_path: format!("imgs/img{index}.jpg"),
        thumbnail,
    })
}

#[test]
fn item_style_divides_viewport() {
    let style = ItemStyle::for_geometry(&Geometry::new(3, 5, 3));
    assert_eq!(style.width, "19.80");
    assert_eq!(style.height, "33.00");
    assert_eq!(style.margin_vert, "0.17");
    assert_eq!(style.margin_horiz, "0.10");
}

#[test]
fn content_has_one_cell_per_entry() {
    let html = render_gallery_content(&view(vec![
        entry(0, ThumbnailView::Ready("thumbs/img0.jpg".into())),
        None,
        None,
    ]));
    assert_eq!(html.matches(r#"class="flex-item""#).count(), 3);
    assert!(html.contains(r#"<img src="/thumbs/img0.jpg""#));
    assert!(html.contains(r#"href="/imgs/img0.jpg""#));
    assert!(!html.contains("img1.jpg"));
}

#[test]
fn broken_and_missing_thumbnails_render_placeholders() {
    let html = render_gallery_content(&view(vec![
        entry(0, ThumbnailView::Broken),
        entry(1, ThumbnailView::Missing),
    ]));
    assert!(html.contains("thumb-broken"));
    assert!(html.contains("thumb-missing"));
    assert!(!html.contains("<img"));
}

#[test]
fn alt_text_is_html_escaped_and_urls_are_percent_encoded() {
    let html = render_gallery_content(&view(vec![Some(EntryView {
        index: 0,
        serving_path: r#"imgs/"quoted"&<b>.jpg"#.into(),
        thumbnail: ThumbnailView::Ready(r#"thumbs/"quoted"&<b>.jpg"#.into()),
    })]));
    assert!(html.contains(r#"alt="imgs/&quot;quoted&quot;&amp;&lt;b&gt;.jpg""#));
    assert!(html.contains(r#"href="/imgs/%22quoted%22%26%3Cb%3E.jpg""#));
    assert!(html.contains(r#"src="/thumbs/%22quoted%22%26%3Cb%3E.jpg""#));
    assert!(!html.contains("<b>"));
}

#[test]
fn url_reserved_characters_in_file_names_are_encoded() {
    assert_eq!(
        url_path("imgs/trip #2/what?100%.jpg"),
        "/imgs/trip%20%232/what%3F100%25.jpg"
    );
    assert_eq!(url_path("imgs/café.jpg"), "/imgs/caf%C3%A9.jpg");

    let html = render_gallery_content(&view(vec![Some(EntryView {
        index: 0,
        serving_path: "imgs/a#b?c%d.jpg".into(),
        thumbnail: ThumbnailView::Broken,
    })]));
    assert!(html.contains(r#"href="/imgs/a%23b%3Fc%25d.jpg""#));
}

#[test]
fn rest_response_uses_client_field_names() {
    let response = RestResponse::from(&view(vec![None]));
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["DebounceRows"], 2);
    assert!(json["GalleryContent"].as_str().unwrap().contains("flex-item"));
}

#[test]
fn page_embeds_content_and_script() {
    let page = render_page(&view(vec![entry(0, ThumbnailView::Missing)]));
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains(r#"data-debounce-rows="2""#));
    assert!(page.contains("/assets/main.js"));
    assert!(page.contains("imgs/img0.jpg"));
}
