use nom::bytes::complete::{tag, take_while};
use nom::character::complete::{char, one_of};
use nom::error::convert_error;
use nom::error::ParseError;
use nom::error::VerboseError;
use nom::number::complete::float;
use nom::sequence::tuple;
use nom::{Err, IResult};

/// Popup text when a fix was obtained and the map was centered on it.
pub const MSG_FIND_AROUND: &str = "Find around you.";
/// Popup text when the position source exists but yielded no fix.
pub const MSG_SERVICE_FAILED: &str = "Error: The geolocation service failed.";
/// Popup text when no position source is configured at all.
pub const MSG_UNSUPPORTED: &str = "Error: This device doesn't support geolocation.";

/// A geographic fix in WGS84 degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fix {
    pub lat: f32,
    pub lon: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LocateError {
    Unsupported,
    ServiceFailed,
}

impl LocateError {
    /// The fixed user-visible message for this failure.
    pub fn message(&self) -> &'static str {
        match self {
            LocateError::Unsupported => MSG_UNSUPPORTED,
            LocateError::ServiceFailed => MSG_SERVICE_FAILED,
        }
    }
}

/// Reads the current position from the configured NMEA device.
///
/// `device` unset means the host has no position source at all. Any read or
/// parse failure, including a sentence without a valid fix, degrades to
/// [`LocateError::ServiceFailed`]; this never panics.
pub fn current_position(device: Option<&str>) -> Result<Fix, LocateError> {
    let device = device.ok_or(LocateError::Unsupported)?;

    let raw = std::fs::read_to_string(device).map_err(|e| {
        log::warn!("Could not read the position device {}. Reason:\r\n{}", device, e);
        LocateError::ServiceFailed
    })?;

    let sentence = raw
        .lines()
        .find(|line| line.starts_with("$GPGGA") || line.starts_with("$GNGGA"))
        .ok_or_else(|| {
            log::warn!("No GGA sentence found on {}.", device);
            LocateError::ServiceFailed
        })?;

    parse_gga(sentence).ok_or(LocateError::ServiceFailed)
}

/// Tries to parse a single NMEA GGA sentence into a fix.
///
/// Returns `None` for malformed sentences and for sentences whose fix
/// quality field reports no fix.
pub fn parse_gga(sentence: &str) -> Option<Fix> {
    match gga::<VerboseError<&str>>(sentence) {
        Ok((_, fix)) => fix,
        Err(Err::Error(e)) | Err(Err::Failure(e)) => {
            log::info!("Failed to parse the GGA sentence.");
            log::info!("Trace: {}", convert_error(sentence, e));
            None
        }
        Err(Err::Incomplete(_)) => {
            log::info!("Unexpected EOF parsing the GGA sentence.");
            None
        }
    }
}

/// Degrees and decimal minutes (`ddmm.mmm`) to decimal degrees.
fn dm_to_deg(value: f32) -> f32 {
    let degrees = (value / 100.0).trunc();
    degrees + (value - degrees * 100.0) / 60.0
}

fn field<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while(|c| c != ',')(input)
}

/// Parse a GGA sentence.
/// E.g. `$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47`.
fn gga<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Option<Fix>, E> {
    let (remaining, _) = tuple((char('$'), nom::branch::alt((tag("GP"), tag("GN"))), tag("GGA")))(input)?;
    let (remaining, (_, _time, _)) = tuple((char(','), field, char(',')))(remaining)?;
    let (remaining, (lat_raw, _, ns, _)) =
        tuple((float, char(','), one_of("NS"), char(',')))(remaining)?;
    let (remaining, (lon_raw, _, ew, _)) =
        tuple((float, char(','), one_of("EW"), char(',')))(remaining)?;
    let (remaining, quality) = one_of("012345678")(remaining)?;

    if quality == '0' {
        // The device answered but has no fix.
        return Ok((remaining, None));
    }

    let lat = dm_to_deg(lat_raw) * if ns == 'S' { -1.0 } else { 1.0 };
    let lon = dm_to_deg(lon_raw) * if ew == 'W' { -1.0 } else { 1.0 };

    Ok((remaining, Some(Fix { lat, lon })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_sentence() {
        let fix =
            parse_gga("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47").unwrap();

        assert!((fix.lat - 48.1173).abs() < 1e-3);
        assert!((fix.lon - 11.5167).abs() < 1e-3);
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        let fix =
            parse_gga("$GNGGA,064951,3342.605,S,07034.123,W,1,05,1.2,520.0,M,35.0,M,,*58").unwrap();

        assert!(fix.lat < 0.0);
        assert!(fix.lon < 0.0);
    }

    #[test]
    fn no_fix_quality_is_rejected() {
        assert!(
            parse_gga("$GPGGA,123519,4807.038,N,01131.000,E,0,00,,,M,,M,,*47").is_none()
        );
    }

    #[test]
    fn truncated_sentences_are_rejected() {
        assert!(parse_gga("$GPGGA,123519,4807.038,N").is_none());
    }

    #[test]
    fn unconfigured_device_is_unsupported() {
        assert_eq!(current_position(None), Err(LocateError::Unsupported));
        assert_eq!(
            LocateError::Unsupported.message(),
            MSG_UNSUPPORTED
        );
    }

    #[test]
    fn missing_device_is_a_service_failure() {
        assert_eq!(
            current_position(Some("/nonexistent/placemark-gps")),
            Err(LocateError::ServiceFailed)
        );
    }
}
