//! Shared, lock-protected values handed between threads.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` gives every clone access to the same value of type `T`. It wraps an
/// `Arc<RwLock<T>>` and is used wherever a value is written on one thread and observed
/// on another, for example the completion state of a chunk generation request.
///
/// A panic while a guard is held poisons the lock. The guard accessors recover the
/// inner value instead of propagating the panic, so one failed writer does not take
/// down every later reader.
///
/// # Type Parameters
/// - `T`: The type of the contained resource, must be `Send + Sync`
///
/// # Examples
///
/// ## Sharing Between Threads
/// ```
/// # use std::thread;
/// use voxel_world::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let counter_clone = counter.clone();
///
/// let handle = thread::spawn(move || {
///     *counter_clone.get_mut() += 1;
/// });
///
/// handle.join().unwrap();
/// assert_eq!(*counter.get(), 1);
/// ```
#[derive(Debug)]
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    ///
    /// # Arguments
    /// * `resource` - The value to be stored in the resource
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a guard that allows reading the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a guard that allows modifying the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_share_the_value() {
        let resource = MtResource::new(vec![1]);
        let other = resource.clone();
        other.get_mut().push(2);
        assert_eq!(*resource.get(), vec![1, 2]);
        assert!(resource.ptr_eq(&other));
        assert!(!resource.ptr_eq(&MtResource::new(vec![1, 2])));
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let resource = MtResource::new(5);
        let writer = resource.clone();
        let result = thread::spawn(move || {
            let _guard = writer.get_mut();
            panic!("writer failed");
        })
        .join();
        assert!(result.is_err());
        assert_eq!(*resource.get(), 5);
        *resource.get_mut() = 6;
        assert_eq!(*resource.get(), 6);
    }
}
