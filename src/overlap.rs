//! Window overlap parsing (§4.5, §6): `-w|--window-overlap` accepts either a
//! raw token count or a `%` suffixed percentage of the context length.

use crate::error::LlmZipError;

/// Parse `spec` against a model context length `w`, returning the
/// normalized overlap `0 <= overlap < w`.
///
/// Negative integers wrap (`overlap + w`). Percentages are taken of `w - 1`,
/// matching the reference implementation's reservation of one context slot
/// for the token about to be generated.
pub fn parse_overlap(spec: &str, w: usize) -> Result<usize, LlmZipError> {
    if let Some(pct_str) = spec.strip_suffix('%') {
        let pct: f64 = pct_str
            .parse()
            .map_err(|_| LlmZipError::ParameterRange(format!("{spec:?} is not a valid percentage")))?;
        if !(0.0..=100.0).contains(&pct) {
            return Err(LlmZipError::ParameterRange(
                "window overlap must be in the range [0%, 100%]".to_string(),
            ));
        }
        Ok((pct / 100.0 * (w as f64 - 1.0)) as usize)
    } else {
        let raw: i64 = spec.parse().map_err(|_| {
            LlmZipError::ParameterRange(
                "window overlap must be an integer (number of tokens) or a percentage (of the model's context length)"
                    .to_string(),
            )
        })?;
        let mut overlap = raw;
        if overlap < 0 {
            overlap += w as i64;
        }
        if overlap < 0 || overlap as usize >= w {
            return Err(LlmZipError::ParameterRange(format!(
                "window overlap must be in the range [{}, {}]",
                -(w as i64),
                w as i64 - 1
            )));
        }
        Ok(overlap as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_integer_overlap() {
        assert_eq!(parse_overlap("5", 16).unwrap(), 5);
        assert_eq!(parse_overlap("0", 16).unwrap(), 0);
    }

    #[test]
    fn negative_integers_wrap_around_context_length() {
        assert_eq!(parse_overlap("-1", 16).unwrap(), 15);
        assert_eq!(parse_overlap("-16", 16).unwrap(), 0);
    }

    #[test]
    fn rejects_overlap_outside_valid_range() {
        assert!(parse_overlap("16", 16).is_err());
        assert!(parse_overlap("-17", 16).is_err());
    }

    #[test]
    fn parses_percentage_of_context_length_minus_one() {
        assert_eq!(parse_overlap("0%", 16).unwrap(), 0);
        assert_eq!(parse_overlap("100%", 16).unwrap(), 15);
        assert_eq!(parse_overlap("50%", 17).unwrap(), 8);
    }

    #[test]
    fn rejects_percentage_outside_0_to_100() {
        assert!(parse_overlap("101%", 16).is_err());
        assert!(parse_overlap("-1%", 16).is_err());
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(parse_overlap("banana", 16).is_err());
        assert!(parse_overlap("1.5", 16).is_err());
    }
}
