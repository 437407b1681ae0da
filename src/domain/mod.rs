pub mod email;
pub mod event;

/// One element of a listing that degrades instead of failing: either a
/// fetched item or the marker left in place of the whole listing when the
/// endpoint could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Item(T),
    Error(String),
}

impl<T> Entry<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            Entry::Item(t) => Some(t),
            Entry::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Entry::Error(_))
    }
}

/// Wrap a fallible listing into the degraded shape.
pub fn degrade<T>(what: &str, res: anyhow::Result<Vec<T>>) -> Vec<Entry<T>> {
    match res {
        Ok(items) => items.into_iter().map(Entry::Item).collect(),
        Err(e) => {
            log::warn!("failed to read {what}: {e:#}");
            vec![Entry::Error(format!("failed to read {what}: {e:#}"))]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn degrade_keeps_items() {
        let v = degrade("emails", Ok(vec![1, 2]));
        assert_eq!(v, vec![Entry::Item(1), Entry::Item(2)]);
    }

    #[test]
    fn degrade_collapses_failure_into_one_marker() {
        let v: Vec<Entry<u8>> = degrade("events", Err(anyhow!("503 Service Unavailable")));
        assert_eq!(v.len(), 1);
        assert!(v[0].is_error());
        assert_eq!(
            v[0],
            Entry::Error("failed to read events: 503 Service Unavailable".to_string())
        );
    }
}
