// ============================================================================
// tvstream-core/src/pipeline/options.rs
// ============================================================================
//
// PIPELINE OPTIONS: Global, Input, Output and Environment Options
//
// Each option is a variant holding exactly the data it renders. Rendering is
// a pure function of the variant; nothing here knows about build order.
//
// KEY COMPONENTS:
// - GlobalOption: flags placed before every input
// - InputOption: options attached to one input, rendered before its `-i`
// - OutputOption: muxer, rate control and metadata options, plus the target
// - EnvironmentVariable: variables set on the transcoder process
//
// AI-ASSISTANT-INFO: Option variants and their argument rendering

// ---- Standard library imports ----
use std::time::Duration;

// ---- Internal crate imports ----
use crate::media::PixelFormat;
use crate::pipeline::decoder::Decoder;
use crate::pipeline::input::InputSource;
use crate::pipeline::state::HlsSettings;
use crate::pipeline::types::{InputProtocol, InputRole};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Renders a duration the way the transcoder's time parser accepts it.
pub fn format_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}

/// Options placed before every input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalOption {
    ThreadCount(u32),
    NoStdIn,
    HideBanner,
    NoStats,
    LogLevel(String),
    /// `-fflags +genpts+discardcorrupt+igndts`
    StandardFormatFlags,
    CudaHardwareAcceleration,
    QsvHardwareAcceleration { device: Option<String>, decode: bool },
    VaapiHardwareAcceleration { device: String, decode: bool },
}

impl GlobalOption {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::ThreadCount(count) => vec!["-threads".to_string(), count.to_string()],
            Self::NoStdIn => args(&["-nostdin"]),
            Self::HideBanner => args(&["-hide_banner"]),
            Self::NoStats => args(&["-nostats"]),
            Self::LogLevel(level) => vec!["-loglevel".to_string(), level.clone()],
            Self::StandardFormatFlags => args(&["-fflags", "+genpts+discardcorrupt+igndts"]),
            Self::CudaHardwareAcceleration => args(&["-hwaccel", "cuda"]),
            Self::QsvHardwareAcceleration { device, decode } => {
                let init = match device {
                    Some(device) => format!("qsv=hw:{device}"),
                    None => "qsv=hw".to_string(),
                };
                let mut out = vec![
                    "-init_hw_device".to_string(),
                    init,
                    "-filter_hw_device".to_string(),
                    "hw".to_string(),
                ];
                if *decode {
                    out.extend(args(&["-hwaccel", "qsv", "-hwaccel_output_format", "qsv"]));
                }
                out
            }
            Self::VaapiHardwareAcceleration { device, decode } => {
                let mut out = Vec::new();
                if *decode {
                    out.extend(args(&["-hwaccel", "vaapi"]));
                }
                out.push("-vaapi_device".to_string());
                out.push(device.clone());
                out
            }
        }
    }
}

/// Options attached to one input and rendered immediately before its `-i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOption {
    Decoder(Decoder),
    StreamSeek(Duration),
    /// `-readrate 1.0` with an optional initial burst in seconds
    Readrate { initial_burst: u32 },
    InfiniteLoop,
    DoNotIgnoreLoop,
    ConcatFormat,
    HttpReconnect,
    ConcatHttpReconnect,
    UserAgent(String),
    Lavfi,
}

impl InputOption {
    /// Whether this option is meaningful for `input`.
    pub fn applies_to(&self, input: &InputSource) -> bool {
        match self {
            Self::Decoder(_) => matches!(input.role, InputRole::Video | InputRole::StillImage),
            // Seeking into a still image or a generated source is meaningless.
            Self::StreamSeek(_) => {
                matches!(input.role, InputRole::Video | InputRole::Audio)
                    && input.protocol != InputProtocol::Lavfi
            }
            Self::Readrate { .. } => matches!(
                input.role,
                InputRole::Video | InputRole::Audio | InputRole::Concat
            ),
            Self::InfiniteLoop => true,
            Self::DoNotIgnoreLoop => input.role == InputRole::Watermark,
            Self::ConcatFormat => input.role == InputRole::Concat,
            Self::HttpReconnect | Self::ConcatHttpReconnect | Self::UserAgent(_) => {
                input.protocol == InputProtocol::Http
            }
            Self::Lavfi => input.protocol == InputProtocol::Lavfi,
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Decoder(decoder) => decoder.input_args(),
            Self::StreamSeek(start) => vec!["-ss".to_string(), format_millis(*start)],
            Self::Readrate { initial_burst } => {
                let mut out = args(&["-readrate", "1.0"]);
                if *initial_burst > 0 {
                    out.push("-readrate_initial_burst".to_string());
                    out.push(initial_burst.to_string());
                }
                out
            }
            Self::InfiniteLoop => args(&["-stream_loop", "-1"]),
            Self::DoNotIgnoreLoop => args(&["-ignore_loop", "0"]),
            Self::ConcatFormat => args(&[
                "-f",
                "concat",
                "-safe",
                "0",
                "-protocol_whitelist",
                "file,http,tcp,https,tls",
                "-probesize",
                "32",
            ]),
            Self::HttpReconnect => args(&[
                "-reconnect",
                "1",
                "-reconnect_on_network_error",
                "1",
                "-reconnect_streamed",
                "1",
                "-reconnect_delay_max",
                "10",
            ]),
            Self::ConcatHttpReconnect => args(&[
                "-reconnect",
                "1",
                "-reconnect_at_eof",
                "1",
                "-reconnect_streamed",
                "1",
                "-multiple_requests",
                "1",
            ]),
            Self::UserAgent(agent) => vec!["-user_agent".to_string(), agent.clone()],
            Self::Lavfi => args(&["-f", "lavfi"]),
        }
    }
}

/// Options placed after all inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputOption {
    /// `-muxdelay 0 -muxpreload 0`
    NoDemuxDecodeDelay,
    ClosedGop,
    FastStart,
    /// Fragmented MP4 flags for MP4 and fMP4 HLS output
    Mp4Flags,
    NoAutoScale,
    NoSceneDetect,
    TimeLimit(Duration),
    OutputTsOffset { offset: u64, timescale: u32 },
    FrameRate(u32),
    VideoTrackTimescale(u32),
    VideoBitrate(u32),
    VideoBufferSize(u32),
    PixelFormat(PixelFormat),
    AudioChannels(u32),
    AudioBitrate(u32),
    AudioBufferSize(u32),
    AudioSampleRate(u32),
    DoNotMapMetadata,
    MetadataServiceProvider(String),
    MetadataServiceName(String),
    MpegTsFormat,
    MatroskaFormat,
    Mp4Format,
    NutFormat,
    Hls { settings: HlsSettings, key_frame_seconds: Option<u32> },
    HlsConcat { settings: HlsSettings },
    /// `pipe:1`; always rendered last
    PipeTarget,
    /// A file or playlist path; always rendered last
    FileTarget(String),
}

impl OutputOption {
    /// Output destinations are kept at the very end of the argument list.
    pub fn is_target(&self) -> bool {
        matches!(self, Self::PipeTarget | Self::FileTarget(_))
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::NoDemuxDecodeDelay => args(&["-muxdelay", "0", "-muxpreload", "0"]),
            Self::ClosedGop => args(&["-flags", "cgop"]),
            Self::FastStart => args(&["-movflags", "+faststart"]),
            Self::Mp4Flags => args(&[
                "-movflags",
                "+faststart+frag_keyframe+separate_moof+omit_tfhd_offset+empty_moov+delay_moov",
            ]),
            Self::NoAutoScale => args(&["-noautoscale"]),
            Self::NoSceneDetect => args(&["-sc_threshold", "0"]),
            Self::TimeLimit(limit) => vec!["-t".to_string(), format_millis(*limit)],
            Self::OutputTsOffset { offset, timescale } => {
                let seconds = *offset as f64 / f64::from((*timescale).max(1));
                vec!["-output_ts_offset".to_string(), format!("{seconds}")]
            }
            Self::FrameRate(rate) => {
                vec!["-r".to_string(), rate.to_string(), "-vsync".to_string(), "cfr".to_string()]
            }
            Self::VideoTrackTimescale(ts) => {
                vec!["-video_track_timescale".to_string(), ts.to_string()]
            }
            Self::VideoBitrate(kbps) => vec![
                "-b:v".to_string(),
                format!("{kbps}k"),
                "-maxrate:v".to_string(),
                format!("{kbps}k"),
            ],
            Self::VideoBufferSize(kb) => vec!["-bufsize:v".to_string(), format!("{kb}k")],
            Self::PixelFormat(format) => {
                vec!["-pix_fmt".to_string(), format.ffmpeg_name().to_string()]
            }
            Self::AudioChannels(channels) => vec!["-ac".to_string(), channels.to_string()],
            Self::AudioBitrate(kbps) => vec!["-b:a".to_string(), format!("{kbps}k")],
            Self::AudioBufferSize(kb) => vec!["-bufsize:a".to_string(), format!("{kb}k")],
            Self::AudioSampleRate(khz) => vec!["-ar".to_string(), format!("{khz}k")],
            Self::DoNotMapMetadata => args(&["-map_metadata", "-1"]),
            Self::MetadataServiceProvider(provider) => vec![
                "-metadata".to_string(),
                format!("service_provider={provider}"),
            ],
            Self::MetadataServiceName(name) => {
                vec!["-metadata".to_string(), format!("service_name={name}")]
            }
            Self::MpegTsFormat => args(&["-f", "mpegts"]),
            Self::MatroskaFormat => args(&["-f", "matroska"]),
            Self::Mp4Format => args(&["-f", "mp4"]),
            Self::NutFormat => args(&["-f", "nut"]),
            Self::Hls { settings, key_frame_seconds } => {
                let mut out = Vec::new();
                if let Some(seconds) = key_frame_seconds {
                    out.push("-force_key_frames".to_string());
                    out.push(format!("expr:gte(t,n_forced*{seconds})"));
                }
                out.extend(hls_args(settings, HLS_LIVE_FLAGS));
                out
            }
            Self::HlsConcat { settings } => hls_args(settings, "delete_segments+omit_endlist"),
            Self::PipeTarget => args(&["pipe:1"]),
            Self::FileTarget(path) => vec![path.clone()],
        }
    }
}

const HLS_LIVE_FLAGS: &str =
    "program_date_time+append_list+omit_endlist+independent_segments+delete_segments";

fn hls_args(settings: &HlsSettings, flags: &str) -> Vec<String> {
    let mut out = vec![
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        settings.segment_seconds.to_string(),
        "-hls_list_size".to_string(),
        settings.list_size.to_string(),
        "-hls_segment_type".to_string(),
        if settings.uses_fmp4() { "fmp4" } else { "mpegts" }.to_string(),
        "-hls_flags".to_string(),
        flags.to_string(),
    ];
    if let Some(base) = &settings.base_stream_url {
        out.push("-hls_base_url".to_string());
        out.push(base.clone());
    }
    out.push("-hls_segment_filename".to_string());
    out.push(settings.segment_template.clone());
    out
}

/// Variables set in the transcoder's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentVariable {
    VaapiDriver(String),
}

impl EnvironmentVariable {
    pub fn pair(&self) -> (String, String) {
        match self {
            Self::VaapiDriver(driver) => ("LIBVA_DRIVER_NAME".to_string(), driver.clone()),
        }
    }
}
