//! Content stream container
//!
//! Images and animations reach the panel as pre-converted streams produced
//! by the external conversion tool. All integers are little-endian.
//!
//! ```text
//! header  : magic "LEDS" | version u32 | width u32 | height u32 | frame_count u32
//! frame*  : delay_ms u32 | width * height * 3 bytes of RGB
//! ```
//!
//! A frame delay of zero means "hold for the configured image time".

use crate::utils::error::{IntoPlayerError, PlayerError, Result};
use bytemuck::{Pod, Zeroable};
use std::mem::size_of;
use std::path::Path;
use std::time::Duration;

pub const STREAM_MAGIC: [u8; 4] = *b"LEDS";
pub const STREAM_VERSION: u32 = 1;

/// Largest edge accepted, to keep a corrupt header from allocating gigabytes
const MAX_EDGE: u32 = 4096;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawHeader {
    magic: [u8; 4],
    version: u32,
    width: u32,
    height: u32,
    frame_count: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawFrameHeader {
    delay_ms: u32,
}

/// Stream geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
}

impl StreamHeader {
    /// Bytes of one RGB frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub delay_ms: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Explicit delay, or `None` for hold-style frames
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(self.delay_ms as u64))
    }
}

/// Fully loaded content stream
#[derive(Debug, Clone)]
pub struct ContentStream {
    header: StreamHeader,
    frames: Vec<Frame>,
}

impl ContentStream {
    /// Build a stream from frames, validating every frame's size
    pub fn new(width: u32, height: u32, frames: Vec<Frame>) -> Result<Self> {
        let header = StreamHeader {
            width,
            height,
            frame_count: u32::try_from(frames.len())
                .map_err(|_| PlayerError::Stream("too many frames".to_string()))?,
        };
        Self::validate_header(&header)?;

        if let Some((index, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.pixels.len() != header.frame_len())
        {
            return Err(PlayerError::Stream(format!(
                "frame {} has {} bytes, expected {}",
                index,
                frame.pixels.len(),
                header.frame_len()
            )));
        }

        Ok(Self { header, frames })
    }

    /// Single-frame stream for still images
    pub fn still(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Self::new(width, height, vec![Frame { delay_ms: 0, pixels }])
    }

    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).stream_err(&format!("Failed to read {:?}", path))?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let raw: RawHeader = read_pod(data, 0)?;
        if raw.magic != STREAM_MAGIC {
            return Err(PlayerError::Stream("bad magic, not a content stream".to_string()));
        }

        let version = u32::from_le(raw.version);
        if version != STREAM_VERSION {
            return Err(PlayerError::UnsupportedFormat(format!("stream version {}", version)));
        }

        let header = StreamHeader {
            width: u32::from_le(raw.width),
            height: u32::from_le(raw.height),
            frame_count: u32::from_le(raw.frame_count),
        };
        Self::validate_header(&header)?;

        let frame_len = header.frame_len();
        let expected = size_of::<RawHeader>()
            + header.frame_count as usize * (size_of::<RawFrameHeader>() + frame_len);
        if data.len() != expected {
            return Err(PlayerError::Stream(format!(
                "stream is {} bytes, header implies {}",
                data.len(),
                expected
            )));
        }

        let mut offset = size_of::<RawHeader>();
        let mut frames = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            let frame_header: RawFrameHeader = read_pod(data, offset)?;
            offset += size_of::<RawFrameHeader>();

            frames.push(Frame {
                delay_ms: u32::from_le(frame_header.delay_ms),
                pixels: data[offset..offset + frame_len].to_vec(),
            });
            offset += frame_len;
        }

        Ok(Self { header, frames })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let raw = RawHeader {
            magic: STREAM_MAGIC,
            version: STREAM_VERSION.to_le(),
            width: self.header.width.to_le(),
            height: self.header.height.to_le(),
            frame_count: self.header.frame_count.to_le(),
        };

        let mut out = Vec::with_capacity(
            size_of::<RawHeader>() + self.frames.len() * (4 + self.header.frame_len()),
        );
        out.extend_from_slice(bytemuck::bytes_of(&raw));
        for frame in &self.frames {
            let frame_header = RawFrameHeader {
                delay_ms: frame.delay_ms.to_le(),
            };
            out.extend_from_slice(bytemuck::bytes_of(&frame_header));
            out.extend_from_slice(&frame.pixels);
        }
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()).stream_err(&format!("Failed to write {:?}", path))
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn validate_header(header: &StreamHeader) -> Result<()> {
        if header.width == 0 || header.height == 0 {
            return Err(PlayerError::Stream("stream has zero-sized frames".to_string()));
        }
        if header.width > MAX_EDGE || header.height > MAX_EDGE {
            return Err(PlayerError::Stream(format!(
                "stream geometry {}x{} exceeds {}",
                header.width, header.height, MAX_EDGE
            )));
        }
        if header.frame_count == 0 {
            return Err(PlayerError::Stream("stream has no frames".to_string()));
        }
        Ok(())
    }
}

fn read_pod<T: Pod>(data: &[u8], offset: usize) -> Result<T> {
    let end = offset + size_of::<T>();
    if data.len() < end {
        return Err(PlayerError::Stream(format!("truncated stream at byte {}", offset)));
    }
    Ok(bytemuck::pod_read_unaligned(&data[offset..end]))
}
