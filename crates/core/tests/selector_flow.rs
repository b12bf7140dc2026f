//! End-to-end flows through the public API: selector driven by pointer
//! events, hosted by the wizard, exported at native resolution.

use doc_crop_core::geometry::SelectionRect;
use doc_crop_core::wizard::WizardState;
use doc_crop_core::{
    AppError, Config, DocCrop, ExportedImage, ImageProcessor, RegionSelector, ScreenPreset, SelectionHost,
    SelectorConfig, SourceImage, Wizard,
};
use image::{DynamicImage, Rgb, RgbImage};

fn document(width: u32, height: u32) -> SourceImage {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x / 4) as u8, (y / 4) as u8, 200]));
    SourceImage::new(DynamicImage::ImageRgb8(image))
}

/// Small deterministic generator so the pointer paths are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self, range: f32) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) as f32 / (1u64 << 31) as f32) * range
    }
}

#[test]
fn selection_stays_inside_viewport_for_any_pointer_path() {
    for (seed, (w, h)) in [(1, (1000, 500)), (2, (300, 900)), (3, (640, 640)), (4, (37, 1201))] {
        let mut selector =
            RegionSelector::with_image(SelectorConfig::for_screen(ScreenPreset::Select), document(w, h)).unwrap();
        let viewport = selector.viewport().unwrap();
        let mut rng = Lcg(seed);

        for _ in 0..50 {
            selector.pointer_down(rng.next_f32(viewport.width), rng.next_f32(viewport.height));
            for _ in 0..20 {
                // Range deliberately exceeds the viewport on every side.
                let x = rng.next_f32(viewport.width * 3.0) - viewport.width;
                let y = rng.next_f32(viewport.height * 3.0) - viewport.height;
                selector.pointer_move(x, y);

                let rect = selector.selection().unwrap();
                assert!(rect.is_within(&viewport), "{rect:?} escaped {viewport:?}");
            }
            selector.pointer_up();
        }
    }
}

#[test]
fn grabbed_point_follows_pointer_until_clamped() {
    let mut selector = RegionSelector::with_image(SelectorConfig::default(), document(1000, 500)).unwrap();
    let start = selector.selection().unwrap();

    let (px, py) = (start.x + 30.0, start.y + 40.0);
    selector.pointer_down(px, py);

    for (dx, dy) in [(5.0, 0.0), (-20.0, 10.0), (40.0, -25.0), (0.0, 0.0)] {
        let (qx, qy) = (px + dx, py + dy);
        selector.pointer_move(qx, qy);
        let rect = selector.selection().unwrap();
        assert_eq!((qx - rect.x, qy - rect.y), (30.0, 40.0));
    }
}

#[test]
fn wizard_hosts_the_selector() {
    let mut wizard = Wizard::new();
    wizard.select_file(document(1000, 500)).unwrap();
    assert_eq!(wizard.state(), WizardState::Crop);

    let source = wizard.uploaded().cloned().unwrap();
    let mut selector = RegionSelector::with_image(SelectorConfig::default(), source).unwrap();
    selector.pointer_down(100.0, 100.0);
    selector.pointer_move(40.0, 70.0);
    selector.pointer_up();
    assert_eq!(selector.selection(), Some(SelectionRect::new(0.0, 0.0, 480.0, 240.0)));

    selector.confirm(&mut wizard).unwrap();
    assert_eq!(wizard.state(), WizardState::Ready);

    let cropped = wizard.cropped().unwrap();
    assert_eq!((cropped.width, cropped.height), (800, 400));
    assert!(cropped.to_data_url().starts_with("data:image/jpeg;base64,"));

    let decoded = image::load_from_memory(&cropped.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 400));
}

#[test]
fn cancelling_returns_wizard_to_upload() {
    let mut wizard = Wizard::new();
    wizard.select_file(document(400, 400)).unwrap();

    let mut selector =
        RegionSelector::with_image(SelectorConfig::for_screen(ScreenPreset::Select), document(400, 400)).unwrap();
    selector.pointer_down(60.0, 60.0);
    selector.cancel(&mut wizard);

    assert_eq!(wizard.state(), WizardState::Upload);
    assert!(wizard.cropped().is_none());
    assert!(matches!(selector.confirm(&mut wizard), Err(AppError::SelectorClosed)));
}

#[test]
fn facade_uses_configured_screen() {
    let config = Config::builder().with_screen(ScreenPreset::Select).build().unwrap();
    let app = DocCrop::with_config(config);

    let selector = app.selector(document(400, 400)).unwrap();
    assert_eq!(selector.selection(), Some(SelectionRect::new(50.0, 50.0, 400.0, 400.0)));
}

#[test]
fn decoded_png_can_be_cropped() {
    let frame = image::RgbaImage::from_pixel(90, 60, image::Rgba([1, 2, 3, 255]));
    let png = ImageProcessor::encode_png(&frame).unwrap();
    let source = ImageProcessor::decode(&png).unwrap();

    struct Keep(Option<ExportedImage>);
    impl SelectionHost for Keep {
        fn on_selection_complete(&mut self, image: ExportedImage) {
            self.0 = Some(image);
        }
        fn on_cancel(&mut self) {}
    }

    let mut selector = RegionSelector::with_image(SelectorConfig::default(), source).unwrap();
    let mut host = Keep(None);
    selector.confirm(&mut host).unwrap();

    // 90x60 fits 600x400 exactly; default selection is 80% of the source.
    let exported = host.0.unwrap();
    assert_eq!((exported.width, exported.height), (72, 48));
}
