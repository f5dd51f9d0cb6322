use core::fmt;
use core::marker::PhantomData;

use embedded_hal::adc::{Channel, OneShot};

use crate::error::SensorError;
use crate::sampling::{AdcScale, VoltageSource};

/// Voltage source backed by an `embedded-hal` one-shot ADC.
///
/// Owns the ADC and the channel pin the probe board is wired to, and
/// converts raw counts to volts with the given [`AdcScale`].
///
/// # Examples
///
/// ```
/// use ph_probe::sampling::{AdcScale, OneShotVoltageSource, VoltageSource};
/// # use embedded_hal_mock::adc::{Mock, MockChan0, Transaction};
/// #
/// # let expectations: [Transaction<u16>; 1] = [Transaction::read(0, 4095)];
/// # let adc = Mock::new(&expectations);
/// # let pin = MockChan0 {};
///
/// let scale = AdcScale::new(3.3, 12).unwrap();
/// let mut probe = OneShotVoltageSource::new(adc, pin, scale);
///
/// // Full scale reads as the reference voltage
/// assert!((probe.read_voltage().unwrap() - 3.3).abs() < 1e-9);
/// ```
pub struct OneShotVoltageSource<Adc, ADC, Word, Pin> {
    adc: Adc,
    pin: Pin,
    scale: AdcScale,
    _marker: PhantomData<(ADC, Word)>,
}

impl<Adc, ADC, Word, Pin> OneShotVoltageSource<Adc, ADC, Word, Pin>
where
    Pin: Channel<ADC>,
    Adc: OneShot<ADC, Word, Pin>,
{
    pub fn new(adc: Adc, pin: Pin, scale: AdcScale) -> Self {
        Self {
            adc,
            pin,
            scale,
            _marker: PhantomData,
        }
    }

    /// Destroys the source and returns the ADC and the `Pin`.
    pub fn release(self) -> (Adc, Pin) {
        (self.adc, self.pin)
    }
}

impl<Adc, ADC, Word, Pin> VoltageSource for OneShotVoltageSource<Adc, ADC, Word, Pin>
where
    Word: Into<u32>,
    Pin: Channel<ADC>,
    Adc: OneShot<ADC, Word, Pin>,
    <Adc as OneShot<ADC, Word, Pin>>::Error: fmt::Debug,
{
    fn read_voltage(&mut self) -> Result<f64, SensorError> {
        let raw: Word =
            nb::block!(self.adc.read(&mut self.pin)).map_err(|err| SensorError::ReadFailed {
                reason: format!("{:?}", err),
            })?;
        Ok(self.scale.to_volts(raw.into()))
    }

    fn describe(&self) -> String {
        format!(
            "one-shot ADC ({:.2} V full scale)",
            self.scale.reference_voltage()
        )
    }
}
