use std::fmt;
use tracing::{debug, warn};

use crate::config::{ContextConfig, DRIVER_DEFAULT_SOURCES};
use crate::system::alc;
use crate::system::{AudioDriver, DeviceHandle};

/// Zero-terminated list of attribute/value pairs passed to context creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeList {
    values: Vec<i32>,
}

impl AttributeList {
    /// Build the creation attributes for `config`.
    ///
    /// `auxiliary_sends` is the already-negotiated EFX send count, or `None`
    /// when EFX is not requested or not available on the device.
    pub fn negotiate(config: &ContextConfig, auxiliary_sends: Option<i32>) -> Self {
        let mut values = Vec::with_capacity(13);

        if config.frequency != 0 {
            values.extend([alc::ALC_FREQUENCY, config.frequency]);
        }
        if config.refresh_rate != 0 {
            values.extend([alc::ALC_REFRESH, config.refresh_rate]);
        }

        values.extend([
            alc::ALC_SYNC,
            if config.synchronous {
                alc::ALC_TRUE
            } else {
                alc::ALC_FALSE
            },
        ]);

        if config.mono_sources != DRIVER_DEFAULT_SOURCES {
            values.extend([alc::ALC_MONO_SOURCES, config.mono_sources]);
        }
        if config.stereo_sources != DRIVER_DEFAULT_SOURCES {
            values.extend([alc::ALC_STEREO_SOURCES, config.stereo_sources]);
        }

        if let Some(sends) = auxiliary_sends {
            values.extend([alc::ALC_MAX_AUXILIARY_SENDS, sends]);
        }

        values.push(0);
        Self { values }
    }

    /// The raw list including the terminating zero
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    /// Attribute/value pairs, without the terminator
    pub fn pairs(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.values[..self.values.len() - 1]
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
    }

    pub fn get(&self, attribute: i32) -> Option<i32> {
        self.pairs()
            .find(|(key, _)| *key == attribute)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, attribute: i32) -> bool {
        self.get(attribute).is_some()
    }
}

impl fmt::Display for AttributeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match attribute_name(key) {
                Some(name) => write!(f, "{}={}", name, value)?,
                None => write!(f, "{:#x}={}", key, value)?,
            }
        }
        Ok(())
    }
}

fn attribute_name(attribute: i32) -> Option<&'static str> {
    match attribute {
        alc::ALC_FREQUENCY => Some("ALC_FREQUENCY"),
        alc::ALC_REFRESH => Some("ALC_REFRESH"),
        alc::ALC_SYNC => Some("ALC_SYNC"),
        alc::ALC_MONO_SOURCES => Some("ALC_MONO_SOURCES"),
        alc::ALC_STEREO_SOURCES => Some("ALC_STEREO_SOURCES"),
        alc::ALC_MAX_AUXILIARY_SENDS => Some("ALC_MAX_AUXILIARY_SENDS"),
        _ => None,
    }
}

/// Decide the auxiliary send count to request, if any.
///
/// EFX is negotiated only when requested, when the driver can enumerate
/// devices, and when the opened device reports `ALC_EXT_EFX`.
pub fn negotiate_auxiliary_sends<D: AudioDriver>(
    config: &ContextConfig,
    driver: &D,
    device: DeviceHandle,
    enumeration_supported: bool,
) -> Option<i32> {
    if !config.enable_efx {
        return None;
    }

    if !enumeration_supported {
        warn!("EFX requested but the driver cannot enumerate devices, skipping EFX negotiation");
        return None;
    }

    if !driver.is_extension_present(Some(device), alc::EXT_EFX) {
        debug!("EFX requested but {} is not present on the device", alc::EXT_EFX);
        return None;
    }

    let sends = match config.max_auxiliary_sends.fixed_count() {
        Some(count) => count,
        None => {
            let reported = driver
                .get_integer(Some(device), alc::ALC_MAX_AUXILIARY_SENDS, 1)
                .first()
                .copied()
                .unwrap_or(0);
            debug!("Driver reports {} auxiliary sends", reported);
            reported
        }
    };

    Some(sends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuxiliarySends;
    use crate::system::mocks::MockAudioDriver;

    #[test]
    fn test_default_config_only_sets_sync() {
        let attributes = AttributeList::negotiate(&ContextConfig::default(), None);
        assert_eq!(attributes.as_slice(), &[alc::ALC_SYNC, 0, 0]);
    }

    #[test]
    fn test_full_attribute_order() {
        let config = ContextConfig::default()
            .with_frequency(44100)
            .with_refresh_rate(50)
            .synchronous(true)
            .with_mono_sources(32)
            .with_stereo_sources(4)
            .with_efx(AuxiliarySends::Two);
        let attributes = AttributeList::negotiate(&config, Some(2));

        assert_eq!(
            attributes.as_slice(),
            &[
                alc::ALC_FREQUENCY,
                44100,
                alc::ALC_REFRESH,
                50,
                alc::ALC_SYNC,
                1,
                alc::ALC_MONO_SOURCES,
                32,
                alc::ALC_STEREO_SOURCES,
                4,
                alc::ALC_MAX_AUXILIARY_SENDS,
                2,
                0
            ]
        );
    }

    #[test]
    fn test_zero_source_count_is_passed_through() {
        let config = ContextConfig::default().with_stereo_sources(0);
        let attributes = AttributeList::negotiate(&config, None);
        assert_eq!(attributes.get(alc::ALC_STEREO_SOURCES), Some(0));
        assert!(!attributes.contains(alc::ALC_MONO_SOURCES));
    }

    fn open_mock_device(driver: &MockAudioDriver) -> DeviceHandle {
        driver.open_device(None).unwrap()
    }

    #[test]
    fn test_sends_not_negotiated_when_efx_disabled() {
        let driver = MockAudioDriver::new();
        driver.add_extension(alc::EXT_EFX);
        let device = open_mock_device(&driver);

        let sends = negotiate_auxiliary_sends(&ContextConfig::default(), &driver, device, true);

        assert_eq!(sends, None);
        assert!(driver.integer_queries().is_empty());
    }

    #[test]
    fn test_driver_default_sends_skipped_without_extension() {
        let driver = MockAudioDriver::new();
        let device = open_mock_device(&driver);
        let config = ContextConfig::default().with_efx(AuxiliarySends::DriverDefault);

        assert_eq!(negotiate_auxiliary_sends(&config, &driver, device, true), None);
        assert!(driver.integer_queries().is_empty());
    }

    #[test]
    fn test_sends_skipped_without_enumeration() {
        let driver = MockAudioDriver::new();
        driver.add_extension(alc::EXT_EFX);
        let device = open_mock_device(&driver);
        let config = ContextConfig::default().with_efx(AuxiliarySends::Two);

        assert_eq!(negotiate_auxiliary_sends(&config, &driver, device, false), None);
    }

    #[test]
    fn test_fixed_sends_do_not_query_driver() {
        let driver = MockAudioDriver::new();
        driver.add_extension(alc::EXT_EFX);
        let device = open_mock_device(&driver);
        let config = ContextConfig::default().with_efx(AuxiliarySends::Three);

        assert_eq!(negotiate_auxiliary_sends(&config, &driver, device, true), Some(3));
        assert!(driver.integer_queries().is_empty());
    }

    #[test]
    fn test_driver_default_sends_use_reported_maximum() {
        let driver = MockAudioDriver::new();
        driver.add_extension(alc::EXT_EFX);
        driver.set_max_auxiliary_sends(4);
        let device = open_mock_device(&driver);
        let config = ContextConfig::default().with_efx(AuxiliarySends::DriverDefault);

        assert_eq!(negotiate_auxiliary_sends(&config, &driver, device, true), Some(4));
        assert_eq!(driver.integer_queries(), vec![alc::ALC_MAX_AUXILIARY_SENDS]);
    }

    #[test]
    fn test_display_names_attributes() {
        let config = ContextConfig::default().with_frequency(22050);
        let attributes = AttributeList::negotiate(&config, None);
        assert_eq!(attributes.to_string(), "ALC_FREQUENCY=22050, ALC_SYNC=0");
    }
}
