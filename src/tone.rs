//! Sidetone generator.
//!
//! [`Oscillator`] produces the samples: a sine at a fixed pitch shaped by a
//! linear attack/decay envelope so the tone never starts or stops on a
//! click. [`ToneGenerator`] is the session-owned handle around it. It opens
//! the output device on the first key-down and keeps it for the rest of the
//! session.
//!
//! Audio failures are never fatal. A device that cannot be opened is logged
//! once and the generator stays silent afterwards.
use std::f32::consts::TAU;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

/// Default sidetone pitch.
pub const DEFAULT_FREQUENCY_HZ: f32 = 600.0;

/// Lowest accepted sidetone pitch.
pub const MIN_FREQUENCY_HZ: f32 = 100.0;

/// Highest accepted sidetone pitch.
pub const MAX_FREQUENCY_HZ: f32 = 2000.0;

/// Sidetone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig
{
    /// Pitch in hertz
    pub frequency_hz: f32,
    /// Peak amplitude, 0.0 to 1.0
    pub volume: f32,
    /// Duration of the attack and of the decay
    pub ramp: Duration,
    /// Delay between release and teardown, long enough for the decay
    pub teardown_delay: Duration,
}

impl Default for ToneConfig
{
    fn default() -> Self
    {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            volume: 0.3,
            ramp: Duration::from_millis(10),
            teardown_delay: Duration::from_millis(50),
        }
    }
}

/// Envelope phase of the oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope
{
    /// No output
    Silent,
    /// Ramping up to full volume
    Attack,
    /// Full volume
    Sustain,
    /// Ramping down to silence
    Decay,
}

/// Sine oscillator with an anti-click envelope.
#[derive(Debug, Clone)]
pub struct Oscillator
{
    /// Position within the current cycle, 0.0 to 1.0
    phase: f32,
    /// Phase advance per sample
    phase_step: f32,
    /// Current amplitude
    gain: f32,
    /// Amplitude change per sample during a ramp
    gain_step: f32,
    /// Peak amplitude
    volume: f32,
    /// Current envelope phase
    envelope: Envelope,
}

impl Oscillator
{
    /// Creates a silent oscillator.
    ///
    /// # Arguments
    ///
    /// * `config` - Pitch, volume and ramp length
    /// * `sample_rate` - Output sample rate in hertz
    #[must_use]
    pub fn new(config: &ToneConfig, sample_rate: u32) -> Self
    {
        #[allow(clippy::cast_precision_loss)]
        let rate = sample_rate.max(1) as f32;
        let ramp_samples = (config.ramp.as_secs_f32() * rate).max(1.0);
        let volume = config.volume.clamp(0.0, 1.0);

        Self {
            phase: 0.0,
            phase_step: config.frequency_hz / rate,
            gain: 0.0,
            gain_step: volume / ramp_samples,
            volume,
            envelope: Envelope::Silent,
        }
    }

    /// Current envelope phase.
    #[must_use]
    pub const fn envelope(&self) -> Envelope
    {
        self.envelope
    }

    /// (Re)starts the tone from the beginning of a cycle.
    pub const fn start(&mut self)
    {
        self.phase = 0.0;
        self.gain = 0.0;
        self.envelope = Envelope::Attack;
    }

    /// Begins the decay towards silence.
    pub fn release(&mut self)
    {
        if matches!(self.envelope, Envelope::Attack | Envelope::Sustain)
        {
            self.envelope = Envelope::Decay;
        }
    }

    /// Cuts the output immediately.
    pub const fn silence(&mut self)
    {
        self.gain = 0.0;
        self.envelope = Envelope::Silent;
    }

    /// Produces the next sample in the range -1.0 to 1.0.
    pub fn next_sample(&mut self) -> f32
    {
        match self.envelope
        {
            Envelope::Silent => return 0.0,
            Envelope::Attack =>
            {
                self.gain += self.gain_step;
                if self.gain >= self.volume
                {
                    self.gain = self.volume;
                    self.envelope = Envelope::Sustain;
                }
            }
            Envelope::Sustain =>
            {}
            Envelope::Decay =>
            {
                self.gain -= self.gain_step;
                if self.gain <= 0.0
                {
                    self.silence();
                    return 0.0;
                }
            }
        }

        let sample = (self.phase * TAU).sin() * self.gain;
        self.phase = (self.phase + self.phase_step).fract();
        sample
    }
}

/// An opened audio output the oscillator plays through.
pub trait ToneOutput
{
    /// Starts or restarts the tone.
    fn start(&mut self);
    /// Begins the decay.
    fn release(&mut self);
    /// Silences the output and releases the device until the next start.
    fn stop(&mut self);
}

/// State of the output device.
enum Device
{
    /// Not requested yet
    Unopened,
    /// Open and usable
    Open(Box<dyn ToneOutput>),
    /// Could not be opened, stays silent
    Unavailable,
}

/// Session-owned sidetone handle.
pub struct ToneGenerator
{
    /// Sidetone parameters
    config: ToneConfig,
    /// Output device, opened lazily
    device: Device,
    /// Whether a tone is sounding or decaying
    playing: bool,
}

impl ToneGenerator
{
    /// Creates a generator that opens the default audio device on first use.
    #[must_use]
    pub const fn new(config: ToneConfig) -> Self
    {
        Self {
            config,
            device: Device::Unopened,
            playing: false,
        }
    }

    /// Creates a generator that never makes a sound.
    #[must_use]
    pub const fn disabled(config: ToneConfig) -> Self
    {
        Self {
            config,
            device: Device::Unavailable,
            playing: false,
        }
    }

    /// Creates a generator playing through an already opened output.
    #[must_use]
    pub fn with_output(config: ToneConfig, output: Box<dyn ToneOutput>) -> Self
    {
        Self {
            config,
            device: Device::Open(output),
            playing: false,
        }
    }

    /// Sidetone parameters.
    #[must_use]
    pub const fn config(&self) -> &ToneConfig
    {
        &self.config
    }

    /// Whether a tone is sounding or still decaying.
    #[must_use]
    pub const fn is_playing(&self) -> bool
    {
        self.playing
    }

    /// Whether the generator can make sound.
    ///
    /// `None` until the device has been requested.
    #[must_use]
    pub const fn is_available(&self) -> Option<bool>
    {
        match self.device
        {
            Device::Unopened => None,
            Device::Open(_) => Some(true),
            Device::Unavailable => Some(false),
        }
    }

    /// Starts the tone, opening the device first if needed.
    pub fn start(&mut self)
    {
        if matches!(self.device, Device::Unopened)
        {
            self.device = match open_default_output(&self.config)
            {
                Ok(output) =>
                {
                    info!("Audio output opened at {}Hz", self.config.frequency_hz);
                    Device::Open(output)
                }
                Err(err) =>
                {
                    warn!("Sidetone disabled: {err:#}");
                    Device::Unavailable
                }
            };
        }

        if let Device::Open(output) = &mut self.device
        {
            output.start();
            self.playing = true;
        }
    }

    /// Begins the decay of a sounding tone.
    pub fn release(&mut self)
    {
        if let Device::Open(output) = &mut self.device
        {
            output.release();
        }
    }

    /// Tears the tone down after its decay.
    pub fn stop(&mut self)
    {
        if let Device::Open(output) = &mut self.device
        {
            output.stop();
        }
        self.playing = false;
    }
}

/// Opens the system's default output device.
///
/// # Errors
///
/// Returns an error if no device is present or the stream can't be built.
#[cfg(feature = "audio")]
fn open_default_output(config: &ToneConfig) -> Result<Box<dyn ToneOutput>>
{
    Ok(Box::new(device::DeviceOutput::open(config)?))
}

/// Opens the system's default output device.
///
/// # Errors
///
/// Always, since the crate was built without the `audio` feature.
#[cfg(not(feature = "audio"))]
fn open_default_output(_config: &ToneConfig) -> Result<Box<dyn ToneOutput>>
{
    Err(anyhow::anyhow!("built without the `audio` feature"))
}

#[cfg(feature = "audio")]
mod device
{
    use std::sync::{Arc, Mutex, PoisonError};

    use anyhow::{Context, Result, bail};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
    use log::{error, warn};

    use super::{Oscillator, ToneConfig, ToneOutput};

    /// Oscillator played through a cpal output stream.
    pub struct DeviceOutput
    {
        oscillator: Arc<Mutex<Oscillator>>,
        // Not `Send` on every platform, so it stays on the UI thread.
        stream: Stream,
    }

    impl DeviceOutput
    {
        /// Builds a paused stream on the default output device.
        pub fn open(config: &ToneConfig) -> Result<Self>
        {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .context("No audio output device")?;
            let supported = device
                .default_output_config()
                .context("Failed to query audio output config")?;

            let sample_format = supported.sample_format();
            let stream_config: StreamConfig = supported.into();
            let oscillator = Arc::new(Mutex::new(Oscillator::new(
                config,
                stream_config.sample_rate.0,
            )));

            let stream = match sample_format
            {
                SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, &oscillator)?,
                SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, &oscillator)?,
                SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, &oscillator)?,
                other => bail!("Unsupported sample format {other:?}"),
            };

            stream
                .pause()
                .context("Failed to pause audio stream")?;

            Ok(Self { oscillator, stream })
        }

        /// Runs `update` against the shared oscillator.
        fn with_oscillator(&self, update: impl FnOnce(&mut Oscillator))
        {
            let mut oscillator = self
                .oscillator
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            update(&mut oscillator);
        }
    }

    impl ToneOutput for DeviceOutput
    {
        fn start(&mut self)
        {
            self.with_oscillator(Oscillator::start);

            if let Err(err) = self.stream.play()
            {
                warn!("Failed to start audio stream: {err}");
            }
        }

        fn release(&mut self)
        {
            self.with_oscillator(Oscillator::release);
        }

        fn stop(&mut self)
        {
            self.with_oscillator(Oscillator::silence);

            if let Err(err) = self.stream.pause()
            {
                warn!("Failed to pause audio stream: {err}");
            }
        }
    }

    /// Builds an output stream writing the oscillator into every channel.
    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        oscillator: &Arc<Mutex<Oscillator>>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = usize::from(config.channels.max(1));
        let oscillator = Arc::clone(oscillator);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut oscillator = oscillator
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);

                    for frame in data.chunks_mut(channels)
                    {
                        let value = T::from_sample(oscillator.next_sample());
                        frame.fill(value);
                    }
                },
                |err| {
                    error!("Audio stream error: {err}");
                },
                None,
            )
            .context("Failed to build audio stream")
    }
}

/// Output that records the calls it receives, shared by the session tests.
#[cfg(test)]
pub(crate) struct Recorder(pub(crate) std::rc::Rc<std::cell::RefCell<Vec<&'static str>>>);

#[cfg(test)]
impl ToneOutput for Recorder
{
    fn start(&mut self)
    {
        self.0.borrow_mut().push("start");
    }

    fn release(&mut self)
    {
        self.0.borrow_mut().push("release");
    }

    fn stop(&mut self)
    {
        self.0.borrow_mut().push("stop");
    }
}

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const SAMPLE_RATE: u32 = 8000;

    fn config() -> ToneConfig
    {
        // 10ms ramp = 80 samples at 8kHz
        ToneConfig {
            frequency_hz: 800.0,
            ..ToneConfig::default()
        }
    }

    #[test]
    fn silent_until_started()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);

        for _ in 0..100
        {
            assert!(oscillator.next_sample().abs() < f32::EPSILON);
        }
        assert_eq!(oscillator.envelope(), Envelope::Silent);
    }

    #[test]
    fn attack_reaches_sustain()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);
        oscillator.start();
        assert_eq!(oscillator.envelope(), Envelope::Attack);

        let first = oscillator.next_sample().abs();
        for _ in 0..100
        {
            oscillator.next_sample();
        }

        assert_eq!(oscillator.envelope(), Envelope::Sustain);
        assert!(first < 0.01, "attack must start near zero, got {first}");
    }

    #[test]
    fn sustained_tone_swings_both_ways()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);
        oscillator.start();
        for _ in 0..100
        {
            oscillator.next_sample();
        }

        // 800Hz at 8kHz is one cycle every 10 samples
        let cycle: Vec<f32> = (0..10)
            .map(|_| oscillator.next_sample())
            .collect();
        assert!(cycle.iter().any(|&sample| sample > 0.2));
        assert!(cycle.iter().any(|&sample| sample < -0.2));
        assert!(cycle.iter().all(|&sample| sample.abs() <= 0.3 + 1e-6));
    }

    #[test]
    fn release_decays_to_silence()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);
        oscillator.start();
        for _ in 0..100
        {
            oscillator.next_sample();
        }

        oscillator.release();
        assert_eq!(oscillator.envelope(), Envelope::Decay);

        for _ in 0..100
        {
            oscillator.next_sample();
        }
        assert_eq!(oscillator.envelope(), Envelope::Silent);
    }

    #[test]
    fn release_while_silent_stays_silent()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);
        oscillator.release();
        assert_eq!(oscillator.envelope(), Envelope::Silent);
    }

    #[test]
    fn restart_resets_the_ramp()
    {
        let mut oscillator = Oscillator::new(&config(), SAMPLE_RATE);
        oscillator.start();
        for _ in 0..100
        {
            oscillator.next_sample();
        }

        oscillator.start();
        assert_eq!(oscillator.envelope(), Envelope::Attack);
        assert!(oscillator.next_sample().abs() < 0.01);
    }

    #[test]
    fn generator_forwards_to_output()
    {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut generator =
            ToneGenerator::with_output(config(), Box::new(Recorder(Rc::clone(&calls))));

        generator.start();
        assert!(generator.is_playing());
        generator.release();
        generator.stop();
        assert!(!generator.is_playing());

        assert_eq!(*calls.borrow(), ["start", "release", "stop"]);
        assert_eq!(generator.is_available(), Some(true));
    }

    #[test]
    fn disabled_generator_stays_quiet()
    {
        let mut generator = ToneGenerator::disabled(config());

        generator.start();
        assert!(!generator.is_playing());
        assert_eq!(generator.is_available(), Some(false));
    }

    #[cfg(not(feature = "audio"))]
    #[test]
    fn device_is_requested_on_first_start()
    {
        let mut generator = ToneGenerator::new(config());
        assert_eq!(generator.is_available(), None);

        generator.start();
        assert_eq!(generator.is_available(), Some(false));
    }
}
