//! Image-set reconciliation for projects.
//!
//! A create or update request describes the project's desired image set as
//! a list of existing image ids to keep plus zero or more new uploads.
//! [`reconcile`] turns that into detach / attach / create calls against an
//! [`ImageStore`].
//!
//! Contract:
//!
//! - Attached images whose id is not in the retained list are detached. The
//!   stored image itself is never deleted.
//! - Retained ids that do not resolve to a stored image are skipped without
//!   error.
//! - Every upload becomes a new image and is attached, in request order.
//!
//! The steps are not atomic on their own. A failure part-way through leaves
//! whatever was already applied (including newly created images) in place;
//! callers that need all-or-nothing behaviour run the store inside a
//! database transaction.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::types::DbId;

/// A newly uploaded image payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-supplied file name (used for the stored name and the extension).
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Storage operations the reconciler needs.
#[async_trait]
pub trait ImageStore: Send {
    type Error: Send;

    /// Ids of the images currently attached to the project.
    async fn attached_image_ids(&mut self, project_id: DbId) -> Result<Vec<DbId>, Self::Error>;

    /// Remove the association between the project and the image.
    async fn detach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), Self::Error>;

    /// Whether an image with this id exists in storage.
    async fn image_exists(&mut self, image_id: DbId) -> Result<bool, Self::Error>;

    /// Associate the image with the project. Must be idempotent.
    async fn attach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), Self::Error>;

    /// Persist an upload as a new image and return its id.
    async fn create_image(&mut self, upload: ImageUpload) -> Result<DbId, Self::Error>;
}

/// What a reconciliation run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Previously attached images that were detached.
    pub detached: Vec<DbId>,
    /// Requested ids that resolved to a stored image and are now attached.
    pub retained: Vec<DbId>,
    /// Requested ids that did not resolve to a stored image.
    pub skipped: Vec<DbId>,
    /// Images created from this request's uploads.
    pub created: Vec<DbId>,
}

impl ReconcileOutcome {
    /// The project's image ids after reconciliation.
    pub fn final_image_ids(&self) -> Vec<DbId> {
        self.retained
            .iter()
            .chain(self.created.iter())
            .copied()
            .collect()
    }
}

/// Ids from `current` that are absent from `retained`, in `current` order.
pub fn images_to_detach(current: &[DbId], retained: &[DbId]) -> Vec<DbId> {
    let keep: HashSet<DbId> = retained.iter().copied().collect();
    let mut seen = HashSet::new();
    current
        .iter()
        .copied()
        .filter(|id| !keep.contains(id) && seen.insert(*id))
        .collect()
}

/// Collapse duplicate ids while keeping first-seen order.
fn dedup_ids(ids: &[DbId]) -> Vec<DbId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Bring the project's image set in line with `retained_ids` plus `uploads`.
pub async fn reconcile<S>(
    store: &mut S,
    project_id: DbId,
    retained_ids: &[DbId],
    uploads: Vec<ImageUpload>,
) -> Result<ReconcileOutcome, S::Error>
where
    S: ImageStore + ?Sized,
{
    let mut outcome = ReconcileOutcome::default();

    let current = store.attached_image_ids(project_id).await?;
    for image_id in images_to_detach(&current, retained_ids) {
        store.detach(project_id, image_id).await?;
        outcome.detached.push(image_id);
    }

    for image_id in dedup_ids(retained_ids) {
        if store.image_exists(image_id).await? {
            store.attach(project_id, image_id).await?;
            outcome.retained.push(image_id);
        } else {
            tracing::debug!(project_id, image_id, "Skipping unknown image id");
            outcome.skipped.push(image_id);
        }
    }

    for upload in uploads {
        let image_id = store.create_image(upload).await?;
        store.attach(project_id, image_id).await?;
        outcome.created.push(image_id);
    }

    tracing::debug!(
        project_id,
        detached = outcome.detached.len(),
        retained = outcome.retained.len(),
        skipped = outcome.skipped.len(),
        created = outcome.created.len(),
        "Reconciled project images"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    /// In-memory store: image payloads keyed by id plus per-project links.
    #[derive(Default)]
    struct MemoryStore {
        images: BTreeMap<DbId, ImageUpload>,
        links: BTreeMap<DbId, BTreeSet<DbId>>,
        next_id: DbId,
        /// Fail `create_image` once this many images have been created.
        fail_after_creates: Option<usize>,
        creates: usize,
    }

    #[derive(Debug, PartialEq)]
    struct StoreFailure;

    impl MemoryStore {
        fn with_images(ids: &[DbId]) -> Self {
            let mut store = Self::default();
            for &id in ids {
                store.images.insert(id, upload(&format!("{id}.png")));
                store.next_id = store.next_id.max(id);
            }
            store
        }

        fn link(&mut self, project_id: DbId, image_id: DbId) {
            self.links.entry(project_id).or_default().insert(image_id);
        }

        fn attached(&self, project_id: DbId) -> BTreeSet<DbId> {
            self.links.get(&project_id).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl ImageStore for MemoryStore {
        type Error = StoreFailure;

        async fn attached_image_ids(&mut self, project_id: DbId) -> Result<Vec<DbId>, StoreFailure> {
            Ok(self.attached(project_id).into_iter().collect())
        }

        async fn detach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), StoreFailure> {
            if let Some(set) = self.links.get_mut(&project_id) {
                set.remove(&image_id);
            }
            Ok(())
        }

        async fn image_exists(&mut self, image_id: DbId) -> Result<bool, StoreFailure> {
            Ok(self.images.contains_key(&image_id))
        }

        async fn attach(&mut self, project_id: DbId, image_id: DbId) -> Result<(), StoreFailure> {
            self.link(project_id, image_id);
            Ok(())
        }

        async fn create_image(&mut self, upload: ImageUpload) -> Result<DbId, StoreFailure> {
            if self.fail_after_creates == Some(self.creates) {
                return Err(StoreFailure);
            }
            self.creates += 1;
            self.next_id += 1;
            self.images.insert(self.next_id, upload);
            Ok(self.next_id)
        }
    }

    fn upload(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            bytes: name.as_bytes().to_vec(),
        }
    }

    const PROJECT: DbId = 10;

    #[tokio::test]
    async fn retains_subset_and_attaches_upload() {
        let mut store = MemoryStore::with_images(&[1, 2, 3]);
        for id in [1, 2, 3] {
            store.link(PROJECT, id);
        }

        let outcome = reconcile(&mut store, PROJECT, &[1, 3], vec![upload("new.png")])
            .await
            .unwrap();

        assert_eq!(outcome.detached, vec![2]);
        assert_eq!(outcome.created, vec![4]);
        assert_eq!(store.attached(PROJECT), BTreeSet::from([1, 3, 4]));
        // The detached image is still stored.
        assert!(store.images.contains_key(&2));
    }

    #[tokio::test]
    async fn unknown_ids_are_skipped_silently() {
        let mut store = MemoryStore::with_images(&[1]);

        let outcome = reconcile(&mut store, PROJECT, &[1, 99, 100], Vec::new())
            .await
            .unwrap();

        assert_eq!(outcome.retained, vec![1]);
        assert_eq!(outcome.skipped, vec![99, 100]);
        assert_eq!(store.attached(PROJECT), BTreeSet::from([1]));
    }

    #[tokio::test]
    async fn final_set_ignores_prior_associations() {
        let mut store = MemoryStore::with_images(&[1, 2, 3, 4, 5]);
        for id in [2, 4, 5] {
            store.link(PROJECT, id);
        }

        let outcome = reconcile(
            &mut store,
            PROJECT,
            &[1, 4, 42],
            vec![upload("a.png"), upload("b.jpg")],
        )
        .await
        .unwrap();

        let expected: BTreeSet<DbId> = [1, 4].into_iter().chain(outcome.created.clone()).collect();
        assert_eq!(store.attached(PROJECT), expected);
        assert_eq!(
            outcome.final_image_ids().into_iter().collect::<BTreeSet<_>>(),
            expected
        );
        assert_eq!(outcome.detached, vec![2, 5]);
    }

    #[tokio::test]
    async fn repeated_runs_without_uploads_are_idempotent() {
        let mut store = MemoryStore::with_images(&[1, 2, 3]);
        for id in [1, 2] {
            store.link(PROJECT, id);
        }

        reconcile(&mut store, PROJECT, &[2, 3], Vec::new()).await.unwrap();
        let first = store.attached(PROJECT);
        let second_outcome = reconcile(&mut store, PROJECT, &[2, 3], Vec::new())
            .await
            .unwrap();

        assert_eq!(store.attached(PROJECT), first);
        assert!(second_outcome.detached.is_empty());
    }

    #[tokio::test]
    async fn empty_request_detaches_everything() {
        let mut store = MemoryStore::with_images(&[1, 2]);
        store.link(PROJECT, 1);
        store.link(PROJECT, 2);

        reconcile(&mut store, PROJECT, &[], Vec::new()).await.unwrap();

        assert!(store.attached(PROJECT).is_empty());
        assert_eq!(store.images.len(), 2);
    }

    #[tokio::test]
    async fn uploads_keep_request_order() {
        let mut store = MemoryStore::default();

        let outcome = reconcile(
            &mut store,
            PROJECT,
            &[],
            vec![upload("first.png"), upload("second.png")],
        )
        .await
        .unwrap();

        assert_eq!(outcome.created, vec![1, 2]);
        assert_eq!(store.images[&1].file_name, "first.png");
        assert_eq!(store.images[&2].file_name, "second.png");
    }

    #[tokio::test]
    async fn failure_mid_upload_keeps_earlier_changes() {
        let mut store = MemoryStore::with_images(&[1]);
        store.link(PROJECT, 1);
        store.fail_after_creates = Some(1);

        let result = reconcile(
            &mut store,
            PROJECT,
            &[],
            vec![upload("ok.png"), upload("boom.png")],
        )
        .await;

        assert_eq!(result, Err(StoreFailure));
        // Detach and the first upload were applied before the failure.
        assert_eq!(store.attached(PROJECT), BTreeSet::from([2]));
    }

    #[test]
    fn detach_list_preserves_current_order() {
        assert_eq!(images_to_detach(&[5, 3, 1, 3], &[1]), vec![5, 3]);
        assert!(images_to_detach(&[], &[1, 2]).is_empty());
    }
}
