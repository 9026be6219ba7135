pub const QOI_OP_INDEX: u8 = 0x00; // 00xxxxxx
pub const QOI_OP_DIFF: u8 = 0x40; // 01xxxxxx
pub const QOI_OP_LUMA: u8 = 0x80; // 10xxxxxx
pub const QOI_OP_RUN: u8 = 0xc0; // 11xxxxxx
pub const QOI_OP_RGB: u8 = 0xfe; // 11111110
pub const QOI_OP_RGBA: u8 = 0xff; // 11111111

pub const QOI_MASK_2: u8 = 0xc0; // 11000000
pub const QOI_MASK_6: u8 = 0x3f; // 00111111

pub const QOI_DIFF_BIAS: u8 = 2;
pub const QOI_LUMA_RB_BIAS: u8 = 8;
pub const QOI_LUMA_G_BIAS: u8 = 32;

pub const QOI_INDEX_SIZE: usize = 64;
pub const QOI_RUN_MAX: u8 = 62;

pub const QOI_HEADER_SIZE: usize = 14;
pub const QOI_MAGIC: [u8; 4] = *b"qoif";

/// Width times height must fit into the 32-bit pixel counter.
pub const QOI_PIXELS_MAX: usize = u32::MAX as usize;

pub const QOI_PADDING: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 0x01]; // 7 zeros and one 0x01 marker
pub const QOI_PADDING_SIZE: usize = 8;
