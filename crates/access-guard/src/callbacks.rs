use std::fmt;

/// Post-admission side effect. Errors are handed back to the caller untouched.
pub type Callback = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Ordered callbacks run on the first `Granted`. A single callback is a
/// one-element list.
#[derive(Default)]
pub struct Callbacks {
    queue: Vec<Callback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single<F>(callback: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self::new().then(callback)
    }

    pub fn then<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.queue.push(Box::new(callback));
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Runs callbacks in order, stopping at the first failure. Whatever ran or
    /// was skipped is gone either way.
    pub(crate) fn dispatch(&mut self) -> Result<(), (usize, anyhow::Error)> {
        for (index, callback) in std::mem::take(&mut self.queue).into_iter().enumerate() {
            callback().map_err(|err| (index, err))?;
        }
        Ok(())
    }
}

impl From<Vec<Callback>> for Callbacks {
    fn from(queue: Vec<Callback>) -> Self {
        Self { queue }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("len", &self.queue.len())
            .finish()
    }
}
