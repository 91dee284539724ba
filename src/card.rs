use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};

/// Inline SVG of a QR code encoding `link`.
///
/// Printed cards get scanned from paper, so the highest error-correction
/// level is used and the quiet zone is kept.
pub fn qr_svg(link: &str) -> anyhow::Result<String> {
    Ok(encode(link)?
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .quiet_zone(true)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

fn encode(link: &str) -> anyhow::Result<QrCode> {
    Ok(QrCode::with_error_correction_level(link.as_bytes(), EcLevel::H)?)
}
