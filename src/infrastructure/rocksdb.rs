use crate::domain::account::{Account, AccountId, ProgressTracker, TrackerId};
use crate::domain::course::{Course, CourseId};
use crate::domain::ports::{AccountStore, CatalogStore, EnrollOutcome, ProgressStore};
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for course records (including their enrolled sets).
pub const CF_COURSES: &str = "courses";
/// Column Family for purchaser accounts.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for progress trackers.
pub const CF_TRACKERS: &str = "trackers";

const TRACKER_SEQ_KEY: &[u8] = b"tracker_seq";

/// A persistent store implementation using RocksDB.
///
/// Backs the catalog, account and progress ports from one database with
/// separate Column Families. Read-modify-write operations (the conditional
/// enrollment insert, account appends, the tracker sequence) are serialized
/// through a store-level mutex so duplicate detection and write happen
/// atomically within the process.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_COURSES, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRACKERS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Seeds a course only if absent, so re-running a driver against an
    /// existing database does not wipe recorded enrollments.
    pub fn seed_course(&self, course: &Course) -> Result<()> {
        let cf = self.cf(CF_COURSES)?;
        let key = course.id.as_str().as_bytes();
        if self.db.get_pinned_cf(&cf, key)?.is_none() {
            self.db.put_cf(&cf, key, to_json(course)?)?;
        }
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PurchaseError::Internal(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read_course(&self, id: &CourseId) -> Result<Option<Course>> {
        let cf = self.cf(CF_COURSES)?;
        match self.db.get_cf(&cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(from_json(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_course(&self, course: &Course) -> Result<()> {
        let cf = self.cf(CF_COURSES)?;
        self.db
            .put_cf(&cf, course.id.as_str().as_bytes(), to_json(course)?)?;
        Ok(())
    }

    fn read_account(&self, id: &AccountId) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(&cf, id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(from_json(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(&cf, account.id.as_str().as_bytes(), to_json(account)?)?;
        Ok(())
    }

    fn next_tracker_id(&self) -> Result<TrackerId> {
        let cf = self.cf(CF_TRACKERS)?;
        let seq = match self.db.get_cf(&cf, TRACKER_SEQ_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PurchaseError::Internal(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt tracker sequence",
                    )))
                })?;
                u64::from_be_bytes(bytes) + 1
            }
            None => 1,
        };
        self.db.put_cf(&cf, TRACKER_SEQ_KEY, seq.to_be_bytes())?;
        Ok(TrackerId::new(format!("trk_{seq}")))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        PurchaseError::Internal(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Serialization error: {e}"),
        )))
    })
}

fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        PurchaseError::Internal(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {e}"),
        )))
    })
}

#[async_trait]
impl CatalogStore for RocksDbStore {
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>> {
        self.read_course(id)
    }

    async fn find_courses_except(&self, except: &[CourseId]) -> Result<Vec<Course>> {
        let cf = self.cf(CF_COURSES)?;
        let mut listed = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let course: Course = from_json(&value)?;
            if !except.contains(&course.id) {
                listed.push(course);
            }
        }
        Ok(listed)
    }

    async fn enroll(&self, course: &CourseId, purchaser: &AccountId) -> Result<EnrollOutcome> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read_course(course)?
            .ok_or_else(|| PurchaseError::CourseNotFound(course.clone()))?;
        if !record.enrolled.insert(purchaser.clone()) {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }
        self.write_course(&record)?;
        Ok(EnrollOutcome::Created)
    }

    async fn revoke_enrollment(&self, course: &CourseId, purchaser: &AccountId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if let Some(mut record) = self.read_course(course)? {
            if record.enrolled.remove(purchaser) {
                self.write_course(&record)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn find(&self, id: &AccountId) -> Result<Option<Account>> {
        self.read_account(id)
    }

    async fn register(&self, account: Account) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        // Provisioning an existing id must not reset its grants.
        if self.read_account(&account.id)?.is_none() {
            self.write_account(&account)?;
        }
        Ok(())
    }

    async fn add_course(&self, id: &AccountId, course: &CourseId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut account = self
            .read_account(id)?
            .ok_or_else(|| PurchaseError::AccountNotFound(id.clone()))?;
        if !account.courses.contains(course) {
            account.courses.push(course.clone());
            self.write_account(&account)?;
        }
        Ok(())
    }

    async fn add_progress_ref(&self, id: &AccountId, tracker: &TrackerId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut account = self
            .read_account(id)?
            .ok_or_else(|| PurchaseError::AccountNotFound(id.clone()))?;
        if !account.progress.contains(tracker) {
            account.progress.push(tracker.clone());
            self.write_account(&account)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for RocksDbStore {
    async fn create_tracker(&self, course: &CourseId, purchaser: &AccountId) -> Result<TrackerId> {
        let _guard = self.write_lock.lock().await;
        let id = self.next_tracker_id()?;
        let tracker = ProgressTracker::new(id.clone(), course.clone(), purchaser.clone());
        let cf = self.cf(CF_TRACKERS)?;
        self.db
            .put_cf(&cf, id.as_str().as_bytes(), to_json(&tracker)?)?;
        Ok(id)
    }
}
