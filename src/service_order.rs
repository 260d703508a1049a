use compact_str::CompactString;
use std::cmp::Ordering;

/// Sort key giving service numbers their natural order: numeric part first,
/// alphabetic suffix second, so "2" < "2A" < "12" < "12B" < "980". A plain
/// string sort would put "12" before "2". Service numbers with no leading
/// digits sort after all numeric ones, lexicographically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceNumberKey {
    Numeric(u64, CompactString),
    NonNumeric(CompactString),
}

pub fn service_number_key(service_no: &str) -> ServiceNumberKey {
    let digits_end = service_no
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(service_no.len());

    if digits_end == 0 {
        return ServiceNumberKey::NonNumeric(service_no.into());
    }

    match service_no[..digits_end].parse::<u64>() {
        Ok(number) => ServiceNumberKey::Numeric(number, service_no[digits_end..].into()),
        // a digit run too long for u64 is not a real service number
        Err(_) => ServiceNumberKey::NonNumeric(service_no.into()),
    }
}

pub fn compare_service_numbers(a: &str, b: &str) -> Ordering {
    service_number_key(a).cmp(&service_number_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_then_suffix_ordering() {
        let mut service_numbers = vec!["980", "12B", "2A", "12", "2"];
        service_numbers.sort_by(|a, b| compare_service_numbers(a, b));
        assert_eq!(service_numbers, vec!["2", "2A", "12", "12B", "980"]);
    }

    #[test]
    fn empty_suffix_sorts_before_any_suffix() {
        assert_eq!(compare_service_numbers("2", "2A"), Ordering::Less);
        assert_eq!(compare_service_numbers("2A", "2B"), Ordering::Less);
        assert_eq!(compare_service_numbers("2B", "2"), Ordering::Greater);
    }

    #[test]
    fn non_numeric_sorts_after_numeric() {
        let mut service_numbers = vec!["NR7", "2", "CT8", "980"];
        service_numbers.sort_by(|a, b| compare_service_numbers(a, b));
        assert_eq!(service_numbers, vec!["2", "980", "CT8", "NR7"]);
    }

    #[test]
    fn key_is_a_total_order() {
        let samples = [
            "", "0", "2", "2A", "2B", "12", "12B", "12e", "980", "NR7", "CT8", "cT8", "7A7",
            "00012", "18446744073709551616",
        ];

        for a in samples {
            assert_eq!(compare_service_numbers(a, a), Ordering::Equal);
            for b in samples {
                assert_eq!(
                    compare_service_numbers(a, b),
                    compare_service_numbers(b, a).reverse(),
                    "antisymmetry broke for {:?} vs {:?}",
                    a,
                    b
                );
                for c in samples {
                    if compare_service_numbers(a, b) != Ordering::Greater
                        && compare_service_numbers(b, c) != Ordering::Greater
                    {
                        assert_ne!(
                            compare_service_numbers(a, c),
                            Ordering::Greater,
                            "transitivity broke for {:?} <= {:?} <= {:?}",
                            a,
                            b,
                            c
                        );
                    }
                }
            }
        }
    }
}
