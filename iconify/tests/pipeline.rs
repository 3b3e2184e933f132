use iconify::ico::IcoEncodeError;
use iconify::profile::{ConversionProfile, ResampleFilter};
use iconify::raster::{SourceFormat, SourceImage};
use iconify::{Converter, IconifyError};
use std::io::Cursor;

fn png_source(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgba([0xFF, 0x00, 0x00, 0xFF])
        } else {
            image::Rgba([0x00, 0x00, 0xFF, 0x80])
        }
    });

    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

#[tokio::test]
async fn converts_png_into_readable_icon() {
    let source = SourceImage::from_bytes(png_source(300, 200)).unwrap();
    assert_eq!(source.format(), SourceFormat::Png);

    let converter = Converter::new(ConversionProfile::default()).unwrap();
    let conversion = converter.convert(&source).await.unwrap();

    let icon_dir = ico::IconDir::read(Cursor::new(&conversion.icon)).unwrap();
    assert_eq!(icon_dir.resource_type(), ico::ResourceType::Icon);

    let sizes = icon_dir
        .entries()
        .iter()
        .map(|e| e.width())
        .collect::<Vec<_>>();
    assert_eq!(sizes, [256, 128, 48, 32, 16]);

    for entry in icon_dir.entries() {
        assert_eq!(entry.width(), entry.height());

        let image = entry.decode().unwrap();
        assert_eq!(image.width(), entry.width());
        assert_eq!(image.rgba_data().len(), (entry.width() * entry.width() * 4) as usize);
    }

    // Transparency survives the round through the encoder
    let small = icon_dir.entries()[4].decode().unwrap();
    let last_pixel = &small.rgba_data()[small.rgba_data().len() - 4..];
    assert!(last_pixel[3] < 0xFF);
}

#[tokio::test]
async fn previews_reuse_and_extend_frames() {
    let profile = ConversionProfile {
        sizes: vec![48, 16],
        preview_sizes: vec![16, 64],
        filter: ResampleFilter::Nearest,
        ..Default::default()
    };

    let source = SourceImage::from_bytes(png_source(64, 64)).unwrap();
    let converter = Converter::new(profile).unwrap();
    let conversion = converter.convert(&source).await.unwrap();

    let previews = converter.previews(&source, &conversion).await.unwrap();
    let sizes = previews.iter().map(|f| f.dimension()).collect::<Vec<_>>();
    assert_eq!(sizes, [16, 64]);
    assert_eq!(previews.get(16), conversion.frames.get(16));
}

#[test]
fn rejects_unsupported_sources_before_rendering() {
    assert!(matches!(
        SourceImage::from_bytes(b"GIF89a not supported".to_vec()),
        Err(iconify::raster::RasterError::UnsupportedFormat)
    ));
}

#[test]
fn rejects_invalid_profiles() {
    let profile = ConversionProfile {
        sizes: vec![512],
        ..Default::default()
    };

    assert!(matches!(
        Converter::new(profile),
        Err(IconifyError::Profile(_))
    ));
}

#[test]
fn encode_errors_convert_into_pipeline_errors() {
    let err: IconifyError = IcoEncodeError::InvalidFrameSet { count: 0 }.into();
    assert!(err.to_string().contains("between 1 and 65535 frames"));
}

#[test]
fn io_errors_keep_their_stage() {
    let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "missing");

    let err: IconifyError = iconify::export::ExportError::from(io()).into();
    assert!(matches!(err, IconifyError::Export(_)));

    let err: IconifyError = iconify::raster::RasterError::from(io()).into();
    assert!(matches!(err, IconifyError::Raster(_)));

    let err: IconifyError = iconify::profile::ProfileError::from(io()).into();
    assert!(matches!(err, IconifyError::Profile(_)));
}
