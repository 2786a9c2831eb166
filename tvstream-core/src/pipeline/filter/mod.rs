// ============================================================================
// tvstream-core/src/pipeline/filter/mod.rs
// ============================================================================
//
// FILTERS: Per-Stream Filter Steps and Their Frame-State Transitions
//
// Every filter the builder can emit is one variant of `Filter`. A variant
// holds exactly what it needs to render its text, and its `next_state`
// describes the frame state that text produces: a filter that starts with
// `hwdownload` leaves frames in software memory, a filter that uploads
// leaves them on that backend's surfaces.
//
// KEY COMPONENTS:
// - Filter: the closed set of video, watermark and audio filters
// - complex: folds per-stream filters into one `-filter_complex` graph
//
// AI-ASSISTANT-INFO: Filter variants, rendering and frame-state updates

pub mod complex;

// ---- Internal crate imports ----
use crate::media::{FrameSize, PixelFormat};
use crate::pipeline::input::WatermarkPosition;
use crate::pipeline::state::FrameState;
use crate::pipeline::step::FrameStateUpdate;
use crate::pipeline::types::{FrameDataLocation, HardwareAccelerationMode};

pub use complex::{ComplexFilter, FilterChain};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    // ---- Deinterlace ----
    SoftwareDeinterlace {
        filter: String,
        download_as: Option<PixelFormat>,
    },
    YadifCuda,
    DeinterlaceQsv,
    DeinterlaceVaapi,

    // ---- Scale and pad ----
    SoftwareScale {
        scaled: FrameSize,
        padded: FrameSize,
        algorithm: String,
        anamorphic: bool,
        download_as: Option<PixelFormat>,
    },
    ScaleCuda {
        scaled: FrameSize,
        padded: FrameSize,
        anamorphic: bool,
        upload: bool,
    },
    ScaleQsv {
        scaled: FrameSize,
        /// Sample aspect ratio of an anamorphic source, e.g. `32:27`
        sample_aspect_ratio: Option<String>,
        upload: bool,
    },
    ScaleVaapi {
        scaled: FrameSize,
        padded: FrameSize,
        anamorphic: bool,
        upload: bool,
    },
    Pad {
        padded: FrameSize,
        download_as: Option<PixelFormat>,
    },

    // ---- Still images ----
    Loop,
    Realtime,

    // ---- Surface transfer and pixel format ----
    HardwareDownload {
        format: PixelFormat,
    },
    HardwareUploadVaapi,
    HardwareFormat {
        mode: HardwareAccelerationMode,
        format: PixelFormat,
    },
    PixelFormat(PixelFormat),

    // ---- Watermark ----
    WatermarkScale {
        width: u32,
    },
    WatermarkOpacity {
        percent: u32,
    },
    Overlay {
        position: WatermarkPosition,
        x: u32,
        y: u32,
        ten_bit: bool,
    },

    // ---- Audio ----
    AudioFirstPts,
    AudioPad {
        duration_ms: u64,
    },
    Volume {
        percent: u32,
    },
}

fn download_prefix(download_as: Option<&PixelFormat>) -> String {
    download_as.map_or_else(String::new, |format| {
        format!("hwdownload,format={},", format.ffmpeg_name())
    })
}

fn aspect_suffix(scaled: FrameSize, padded: FrameSize) -> &'static str {
    if scaled == padded {
        ""
    } else {
        ":force_original_aspect_ratio=decrease"
    }
}

impl Filter {
    /// Filter text as it appears inside a filter chain.
    pub fn text(&self) -> String {
        match self {
            Self::SoftwareDeinterlace { filter, download_as } => {
                format!("{}{filter}", download_prefix(download_as.as_ref()))
            }
            Self::YadifCuda => "yadif_cuda".to_string(),
            Self::DeinterlaceQsv => "deinterlace_qsv".to_string(),
            Self::DeinterlaceVaapi => "deinterlace_vaapi".to_string(),
            Self::SoftwareScale {
                scaled,
                padded,
                algorithm,
                anamorphic,
                download_as,
            } => {
                let square = if *anamorphic { "scale=iw*sar:ih,setsar=1," } else { "" };
                format!(
                    "{}{square}scale={}:{}:flags={algorithm}{},setsar=1",
                    download_prefix(download_as.as_ref()),
                    padded.width,
                    padded.height,
                    aspect_suffix(*scaled, *padded),
                )
            }
            Self::ScaleCuda {
                scaled,
                padded,
                anamorphic,
                upload,
            } => {
                let upload = if *upload { "hwupload_cuda," } else { "" };
                let square = if *anamorphic { "scale_cuda=iw*sar:ih,setsar=1," } else { "" };
                format!(
                    "{upload}{square}scale_cuda={}:{}{},setsar=1",
                    padded.width,
                    padded.height,
                    aspect_suffix(*scaled, *padded),
                )
            }
            Self::ScaleQsv {
                scaled,
                sample_aspect_ratio,
                upload,
            } => {
                let upload = if *upload { "hwupload=extra_hw_frames=64," } else { "" };
                let square = sample_aspect_ratio.as_ref().map_or_else(String::new, |sar| {
                    format!("vpp_qsv=w=iw*{}:h=ih,setsar=1,", sar.replace(':', "/"))
                });
                format!(
                    "{upload}{square}vpp_qsv=w={}:h={},setsar=1",
                    scaled.width, scaled.height
                )
            }
            Self::ScaleVaapi {
                scaled,
                padded,
                anamorphic,
                upload,
            } => {
                let upload = if *upload { "format=nv12|p010le|vaapi,hwupload," } else { "" };
                let square = if *anamorphic { "scale_vaapi=iw*sar:ih,setsar=1," } else { "" };
                format!(
                    "{upload}{square}scale_vaapi={}:{}{},setsar=1",
                    padded.width,
                    padded.height,
                    aspect_suffix(*scaled, *padded),
                )
            }
            Self::Pad { padded, download_as } => format!(
                "{}pad={}:{}:-1:-1:color=black",
                download_prefix(download_as.as_ref()),
                padded.width,
                padded.height
            ),
            Self::Loop => "loop=-1:1".to_string(),
            Self::Realtime => "realtime".to_string(),
            Self::HardwareDownload { format } => format!("hwdownload,format={}", format.ffmpeg_name()),
            Self::HardwareUploadVaapi => "format=nv12|p010le|vaapi,hwupload=extra_hw_frames=64".to_string(),
            Self::HardwareFormat { mode, format } => {
                let name = format.ffmpeg_name();
                match mode {
                    HardwareAccelerationMode::Nvenc => format!("scale_cuda=format={name}"),
                    HardwareAccelerationMode::Qsv => format!("vpp_qsv=format={name}"),
                    HardwareAccelerationMode::Vaapi => format!("scale_vaapi=format={name}"),
                    HardwareAccelerationMode::None => format!("format={name}"),
                }
            }
            Self::PixelFormat(format) => format!("format={}", format.ffmpeg_name()),
            Self::WatermarkScale { width } => format!("scale={width}:-1"),
            Self::WatermarkOpacity { percent } => {
                format!("colorchannelmixer=aa={}", f64::from(*percent) / 100.0)
            }
            Self::Overlay {
                position,
                x,
                y,
                ten_bit,
            } => {
                let placement = match position {
                    WatermarkPosition::TopLeft => format!("x={x}:y={y}"),
                    WatermarkPosition::TopRight => format!("x=W-w-{x}:y={y}"),
                    WatermarkPosition::BottomLeft => format!("x={x}:y=H-h-{y}"),
                    WatermarkPosition::BottomRight => format!("x=W-w-{x}:y=H-h-{y}"),
                };
                format!("overlay={placement}:format={}", u8::from(*ten_bit))
            }
            Self::AudioFirstPts => "aresample=async=1:first_pts=0".to_string(),
            Self::AudioPad { duration_ms } => format!("apad=whole_dur={duration_ms}ms"),
            Self::Volume { percent } => format!("volume={}", f64::from(*percent) / 100.0),
        }
    }
}

impl FrameStateUpdate for Filter {
    fn affects_frame_state(&self) -> bool {
        !matches!(
            self,
            Self::Loop
                | Self::Realtime
                | Self::WatermarkScale { .. }
                | Self::WatermarkOpacity { .. }
                | Self::AudioFirstPts
                | Self::AudioPad { .. }
                | Self::Volume { .. }
        )
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        let mut next = current.clone();
        match self {
            Self::SoftwareDeinterlace { download_as, .. } => {
                next.interlaced = false;
                next.frame_data_location = FrameDataLocation::Software;
                if let Some(format) = download_as {
                    next.pixel_format = Some(format.clone());
                }
            }
            Self::YadifCuda => {
                next.interlaced = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Nvenc);
            }
            Self::DeinterlaceQsv => {
                next.interlaced = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Qsv);
            }
            Self::DeinterlaceVaapi => {
                next.interlaced = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Vaapi);
            }
            Self::SoftwareScale { scaled, download_as, .. } => {
                next.scaled_size = *scaled;
                next.padded_size = *scaled;
                next.is_anamorphic = false;
                next.frame_data_location = FrameDataLocation::Software;
                if let Some(format) = download_as {
                    next.pixel_format = Some(format.clone());
                }
            }
            Self::ScaleCuda { scaled, .. } => {
                next.scaled_size = *scaled;
                next.padded_size = *scaled;
                next.is_anamorphic = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Nvenc);
            }
            Self::ScaleQsv { scaled, .. } => {
                next.scaled_size = *scaled;
                next.padded_size = *scaled;
                next.is_anamorphic = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Qsv);
            }
            Self::ScaleVaapi { scaled, .. } => {
                next.scaled_size = *scaled;
                next.padded_size = *scaled;
                next.is_anamorphic = false;
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Vaapi);
            }
            Self::Pad { padded, download_as } => {
                next.padded_size = *padded;
                next.frame_data_location = FrameDataLocation::Software;
                if let Some(format) = download_as {
                    next.pixel_format = Some(format.clone());
                }
            }
            Self::HardwareDownload { format } => {
                next.frame_data_location = FrameDataLocation::Software;
                next.pixel_format = Some(format.clone());
            }
            Self::HardwareUploadVaapi => {
                next.frame_data_location = FrameDataLocation::Hardware(HardwareAccelerationMode::Vaapi);
            }
            Self::HardwareFormat { format, .. } | Self::PixelFormat(format) => {
                next.pixel_format = Some(format.clone());
            }
            Self::Overlay { .. } => {
                next.frame_data_location = FrameDataLocation::Software;
            }
            Self::Loop
            | Self::Realtime
            | Self::WatermarkScale { .. }
            | Self::WatermarkOpacity { .. }
            | Self::AudioFirstPts
            | Self::AudioPad { .. }
            | Self::Volume { .. } => {}
        }
        next
    }
}
