// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of uploaded images

pub mod image_utils;

pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, strip_data_url, ImageError, ImageInfo,
    MAX_IMAGE_SIZE,
};
