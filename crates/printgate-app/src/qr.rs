// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR code pointing phones at the upload page.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

use printgate_core::error::{GatewayError, Result};

/// Base64 PNG of a QR code for `http://<host>/upload`.
pub fn upload_page_qr(host: &str) -> Result<String> {
    let url = format!("http://{host}/upload");
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| GatewayError::Encoding(format!("QR code for {url}: {e}")))?;
    let image = code.render::<Luma<u8>>().build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| GatewayError::Encoding(format!("QR code PNG: {e}")))?;

    Ok(STANDARD.encode(png))
}
