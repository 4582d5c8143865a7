//! Utility functions for parsing numbers out of query parameters

use std::str::FromStr;

/// Parses a comma-separated list of numbers into a vector of `u64`.
/// Empty segments are skipped; an empty input yields an empty vector.
pub fn parse_numbers(param: &str) -> Result<Vec<u64>, std::num::ParseIntError> {
    parse_number_type(param, u64::from_str)
}

/// Parses a comma-separated list into a vector of the given type using the
/// provided parse function.
pub fn parse_number_type<T, E>(
    param: &str,
    parse_fn: impl Fn(&str) -> Result<T, E>,
) -> Result<Vec<T>, E> {
    let mut numbers = Vec::new();
    for segment in param.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        numbers.push(parse_fn(trimmed)?);
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_numbers(" 4 , 5 ").unwrap(), vec![4, 5]);
        assert_eq!(parse_numbers("").unwrap(), Vec::<u64>::new());
        assert!(parse_numbers("1,x").is_err());
    }

    #[test]
    fn test_parse_number_type() {
        let parsed = parse_number_type("1,2", |s| s.parse::<i32>()).unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }
}
