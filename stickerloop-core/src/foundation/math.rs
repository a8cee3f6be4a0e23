pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// ITU-R BT.601 luma of an RGB triple, matching the common 8-bit grayscale conversion.
pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let v = u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114;
    ((v + 500) / 1000).min(255) as u8
}
