use std::future::Future;

use crate::error::Error;

/// Existence probe against the remote store, one check per call.
///
/// Implemented by [`FolderProbe`](crate::drive::FolderProbe) against Drive;
/// test code substitutes an in-memory set.
pub trait NameProbe: Send + Sync {
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool, Error>> + Send;
}

/// Base artifact name for a student number and date.
#[must_use]
pub fn base_file_name(student_id: &str, date: &str) -> String {
    format!("{student_id}_{date}.txt")
}

/// Finds the first unused name for `(student_id, date)`.
///
/// Returns `{id}_{date}.txt` when free, otherwise probes
/// `{id}_{date}_{n}.txt` for n = 2, 3, … and returns the first miss.
///
/// This is check-then-use, not an atomic reservation: two concurrent uploads
/// for the same key can both see a name as free and both write it. Drive
/// permits duplicate names, so the collision produces two same-named files
/// rather than an overwrite.
///
/// # Errors
///
/// Propagates the first probe failure.
pub async fn allocate<P: NameProbe>(
    probe: &P,
    student_id: &str,
    date: &str,
) -> Result<String, Error> {
    let base = base_file_name(student_id, date);
    if !probe.exists(&base).await? {
        return Ok(base);
    }

    let mut counter = 2u32;
    loop {
        let candidate = format!("{student_id}_{date}_{counter}.txt");
        if !probe.exists(&candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct TakenNames(HashSet<&'static str>);

    impl NameProbe for TakenNames {
        async fn exists(&self, name: &str) -> Result<bool, Error> {
            Ok(self.0.contains(name))
        }
    }

    #[tokio::test]
    async fn base_name_when_unused() {
        let probe = TakenNames(HashSet::new());
        let name = allocate(&probe, "1234567", "2024-01-02").await.unwrap();
        assert_eq!(name, "1234567_2024-01-02.txt");
    }

    #[tokio::test]
    async fn suffix_starts_at_two() {
        let probe = TakenNames(HashSet::from(["1234567_2024-01-02.txt"]));
        let name = allocate(&probe, "1234567", "2024-01-02").await.unwrap();
        assert_eq!(name, "1234567_2024-01-02_2.txt");
    }

    #[tokio::test]
    async fn probes_until_first_free_suffix() {
        let probe = TakenNames(HashSet::from([
            "1234567_2024-01-02.txt",
            "1234567_2024-01-02_2.txt",
        ]));
        let name = allocate(&probe, "1234567", "2024-01-02").await.unwrap();
        assert_eq!(name, "1234567_2024-01-02_3.txt");
    }

    #[tokio::test]
    async fn probe_failure_propagates() {
        struct Failing;
        impl NameProbe for Failing {
            async fn exists(&self, _name: &str) -> Result<bool, Error> {
                Err(Error::DriveList {
                    status: 503,
                    detail: "backend unavailable".into(),
                })
            }
        }

        let err = allocate(&Failing, "1234567", "2024-01-02").await.unwrap_err();
        assert!(matches!(err, Error::DriveList { .. }));
    }
}
