//! State line decoding

use contracts::VehicleState;

use crate::DecodeError;

/// Decode one whitespace-delimited state line
///
/// Requires exactly `VehicleState::FIELD_COUNT` finite numbers.
pub fn decode_state(payload: &str) -> Result<VehicleState, DecodeError> {
    let tokens: Vec<&str> = payload.split_whitespace().collect();
    if tokens.len() != VehicleState::FIELD_COUNT {
        return Err(DecodeError::WrongFieldCount {
            expected: VehicleState::FIELD_COUNT,
            found: tokens.len(),
        });
    }

    let mut fields = [0.0_f64; VehicleState::FIELD_COUNT];
    for (index, (slot, token)) in fields.iter_mut().zip(&tokens).enumerate() {
        let field = VehicleState::FIELD_NAMES[index];
        let value: f64 = token.parse().map_err(|_| DecodeError::InvalidNumber {
            index,
            field,
            token: (*token).to_string(),
        })?;
        if !value.is_finite() {
            return Err(DecodeError::NonFinite { index, field });
        }
        *slot = value;
    }

    Ok(VehicleState::from_fields(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0";

    #[test]
    fn test_decode_example() {
        let state = decode_state(EXAMPLE).unwrap();
        assert_eq!(state.position.x, 10.0);
        assert_eq!(state.position.y, 5.0);
        assert_eq!(state.orientation.w, 1.0);
        assert_eq!(state.linear_velocity.x, 1.0);
        assert_eq!(state.forward_speed, 2.5);
        assert_eq!(state.timestamp, 100.0);
    }

    #[test]
    fn test_decode_tolerates_extra_whitespace() {
        let padded = format!("  {}\n", EXAMPLE.replace(' ', "\t "));
        assert_eq!(decode_state(&padded).unwrap(), decode_state(EXAMPLE).unwrap());
    }

    #[test]
    fn test_decode_too_few_tokens() {
        let short = "10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5";
        assert_eq!(
            decode_state(short),
            Err(DecodeError::WrongFieldCount {
                expected: 18,
                found: 17
            })
        );
    }

    #[test]
    fn test_decode_too_many_tokens() {
        let long = format!("{EXAMPLE} 1.0");
        assert!(matches!(
            decode_state(&long),
            Err(DecodeError::WrongFieldCount { found: 19, .. })
        ));
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            decode_state(""),
            Err(DecodeError::WrongFieldCount { found: 0, .. })
        ));
    }

    #[test]
    fn test_decode_non_numeric_token() {
        let bad = "10.0 5.0 0.0 0.0 0.0 abc 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0";
        let err = decode_state(bad).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidNumber {
                index: 5,
                field: "orientation.z",
                token: "abc".to_string(),
            }
        );
        assert!(err.to_string().contains("orientation.z"));
        assert_eq!(err.reason(), "invalid_number");
        assert_eq!(decode_state("").unwrap_err().reason(), "field_count");
    }

    #[test]
    fn test_decode_rejects_nan_and_inf() {
        let nan = "NaN 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0";
        assert_eq!(
            decode_state(nan),
            Err(DecodeError::NonFinite {
                index: 0,
                field: "position.x"
            })
        );

        let inf = "10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 inf 100.0";
        assert!(matches!(
            decode_state(inf),
            Err(DecodeError::NonFinite { index: 16, .. })
        ));
    }

    #[test]
    fn test_decode_scientific_notation() {
        let line = "1e1 -5e-1 0 0 0 0 1 0 0 0 0 0 0 0 0 0 0 1.5E2";
        let state = decode_state(line).unwrap();
        assert_eq!(state.position.x, 10.0);
        assert_eq!(state.position.y, -0.5);
        assert_eq!(state.timestamp, 150.0);
    }
}
