mod common;

use image::RgbaImage;
use pxdetect::segment::LayoutMethod;
use pxdetect::{comprehensive_auto_detect, extract_sprites, segment_ccl, Rect};

use common::{fill, inset_sheet, CLEAR};

fn varied_sheet() -> (RgbaImage, Vec<Rect>) {
    let mut img = RgbaImage::from_pixel(800, 800, CLEAR);
    let mut rects = Vec::new();
    for i in 0..64u32 {
        let w = 8 + (i * 7) % 80;
        let h = 8 + (i * 11) % 80;
        let (x, y) = ((i % 8) * 96 + 4, (i / 8) * 96 + 4);
        fill(&mut img, x, y, w, h);
        rects.push(Rect::new(x, y, w, h));
    }
    (img, rects)
}

#[test]
fn isolated_square_is_one_rect() {
    let mut img = RgbaImage::from_pixel(128, 96, CLEAR);
    fill(&mut img, 50, 17, 40, 40);

    let outcome = segment_ccl(&img, None).unwrap();
    assert_eq!(outcome.sprite_bounds, vec![Rect::new(50, 17, 40, 40)]);
}

#[test]
fn uniform_grid_is_regular() {
    let img = inset_sheet(4, 4, 24, 3);
    let outcome = segment_ccl(&img, None).unwrap();

    assert!(!outcome.irregular);
    assert_eq!(outcome.sprite_count(), 16);
    assert_eq!(outcome.method, LayoutMethod::Grid { cols: 4, rows: 4 });
    assert_eq!(outcome.frame_size(), (24, 24));
}

#[test]
fn varied_collection_is_irregular_and_unmerged() {
    let (img, mut expected) = varied_sheet();
    let outcome = segment_ccl(&img, None).unwrap();

    assert!(outcome.irregular);
    assert_eq!(outcome.sprite_count(), expected.len());

    let mut found = outcome.sprite_bounds.clone();
    found.sort_by_key(|r| (r.y, r.x));
    expected.sort_by_key(|r| (r.y, r.x));
    assert_eq!(found, expected);
}

#[test]
fn irregular_sheet_extracts_exact_sprites() {
    let (img, _) = varied_sheet();
    let result = comprehensive_auto_detect(&img, None);

    assert!(result.irregular);
    let rects = result.frame_rects(img.width(), img.height());
    assert_eq!(rects, result.sprite_bounds);

    let sprites = extract_sprites(&img, &rects, true).unwrap();
    assert_eq!(sprites.len(), 64);
    for (sprite, rect) in sprites.iter().zip(&rects) {
        assert_eq!(sprite.image.dimensions(), (rect.width, rect.height));
    }
}
