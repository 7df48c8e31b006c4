use super::client::ApiError;
use crate::models::{Identified, RecordId};
use async_trait::async_trait;
use tracing::debug;

/// A list endpoint a panel can (re)load from.
#[async_trait]
pub trait ResourceSource<T> {
    async fn fetch_all(&self) -> Result<Vec<T>, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Loading,
    Ready,
    Submitting,
    Failed(String),
}

/// Identifies one load. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket(u64);

/// Local copy of one backend resource list.
///
/// The list only changes when the server has confirmed a write or a load
/// finishes. Every load and every confirmed write bumps the generation, so a
/// slow response from an older load cannot overwrite newer data.
///
/// A failed load is remembered until a later load succeeds, so a confirmed
/// write on top of a list that never arrived still reports the load error.
#[derive(Debug, Clone)]
pub struct ResourcePanel<T> {
    items: Vec<T>,
    state: PanelState,
    generation: u64,
    load_error: Option<String>,
}

impl<T> Default for ResourcePanel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            state: PanelState::Loading,
            generation: 0,
            load_error: None,
        }
    }
}

impl<T: Identified> ResourcePanel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            PanelState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = PanelState::Loading;
        LoadTicket(self.generation)
    }

    /// Applies a load result. Returns `false` when the result was stale.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<T>, ApiError>) -> bool {
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, current = self.generation, "Discarding stale panel load");
            return false;
        }
        match result {
            Ok(items) => {
                self.items = items;
                self.load_error = None;
                self.state = PanelState::Ready;
            }
            Err(e) => {
                let message = e.to_string();
                self.load_error = Some(message.clone());
                self.state = PanelState::Failed(message);
            }
        }
        true
    }

    pub async fn refresh<S>(&mut self, source: &S)
    where
        S: ResourceSource<T> + Sync + ?Sized,
    {
        let ticket = self.begin_load();
        let result = source.fetch_all().await;
        self.finish_load(ticket, result);
    }

    pub fn begin_submit(&mut self) {
        self.state = PanelState::Submitting;
    }

    /// Shows a failure that happened before any request was sent.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = PanelState::Failed(message.into());
    }

    pub fn confirm_created(&mut self, result: Result<T, ApiError>) -> bool {
        self.confirm(result, |items, created| items.push(created))
    }

    pub fn confirm_created_many(&mut self, result: Result<Vec<T>, ApiError>) -> bool {
        self.confirm(result, |items, created| items.extend(created))
    }

    pub fn confirm_updated(&mut self, result: Result<T, ApiError>) -> bool {
        self.confirm(result, |items, updated| {
            match items.iter().position(|item| item.id() == updated.id()) {
                Some(index) => items[index] = updated,
                None => items.push(updated),
            }
        })
    }

    /// Keeps the items a multi-step write stored before `error` stopped it.
    pub fn confirm_partial(&mut self, created: Vec<T>, error: ApiError) {
        if !created.is_empty() {
            self.items.extend(created);
            self.generation += 1;
        }
        self.reject(error);
    }

    pub fn confirm_removed<R>(&mut self, id: &RecordId, result: Result<R, ApiError>) -> bool {
        self.confirm(result, |items, _| items.retain(|item| item.id() != id))
    }

    fn confirm<R>(&mut self, result: Result<R, ApiError>, apply: impl FnOnce(&mut Vec<T>, R)) -> bool {
        match result {
            Ok(value) => {
                apply(&mut self.items, value);
                self.generation += 1;
                self.state = match &self.load_error {
                    Some(message) => PanelState::Failed(message.clone()),
                    None => PanelState::Ready,
                };
                true
            }
            Err(e) => {
                self.reject(e);
                false
            }
        }
    }

    fn reject(&mut self, error: ApiError) {
        debug!(status = ?error.status(), "Panel write rejected: {}", error);
        self.state = PanelState::Failed(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: RecordId,
        label: &'static str,
    }

    impl Identified for Row {
        fn id(&self) -> &RecordId {
            &self.id
        }
    }

    fn row(id: &str, label: &'static str) -> Row {
        Row {
            id: RecordId::new(id),
            label,
        }
    }

    fn rejected() -> ApiError {
        ApiError::Rejected {
            status: 409,
            message: "Lab session overlaps an existing booking".to_string(),
        }
    }

    struct Fixed(Vec<Row>);

    #[async_trait]
    impl ResourceSource<Row> for Fixed {
        async fn fetch_all(&self) -> Result<Vec<Row>, ApiError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn panels_start_loading_then_become_ready() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        assert_eq!(panel.state(), &PanelState::Loading);
        let ticket = panel.begin_load();
        assert!(panel.finish_load(ticket, Ok(vec![row("1", "a")])));
        assert_eq!(panel.state(), &PanelState::Ready);
        assert_eq!(panel.items().len(), 1);
    }

    #[test]
    fn stale_load_cannot_overwrite_newer_one() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let first = panel.begin_load();
        let second = panel.begin_load();

        assert!(panel.finish_load(second, Ok(vec![row("1", "page 2")])));
        assert!(!panel.finish_load(first, Ok(vec![row("9", "page 1")])));
        assert_eq!(panel.items(), &[row("1", "page 2")]);
    }

    #[test]
    fn confirmed_write_supersedes_in_flight_load() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.begin_submit();
        assert!(panel.confirm_created(Ok(row("3", "new"))));

        assert!(!panel.finish_load(ticket, Ok(Vec::new())));
        assert_eq!(panel.items(), &[row("3", "new")]);
    }

    #[test]
    fn failed_write_leaves_list_untouched() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Ok(vec![row("1", "a"), row("2", "b")]));

        panel.begin_submit();
        assert_eq!(panel.state(), &PanelState::Submitting);
        assert!(!panel.confirm_removed::<()>(&RecordId::new("1"), Err(rejected())));
        assert_eq!(panel.items().len(), 2);
        assert_eq!(panel.error(), Some("Lab session overlaps an existing booking"));
    }

    #[test]
    fn updates_replace_in_place_and_removals_touch_only_their_row() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Ok(vec![row("1", "a"), row("2", "b"), row("3", "c")]));

        panel.confirm_updated(Ok(row("2", "b2")));
        assert_eq!(panel.items()[1], row("2", "b2"));

        panel.confirm_removed(&RecordId::new("1"), Ok(()));
        assert_eq!(panel.items(), &[row("2", "b2"), row("3", "c")]);
        assert!(panel.get(&RecordId::new("1")).is_none());
    }

    #[test]
    fn failed_load_keeps_previous_items() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Ok(vec![row("1", "a")]));
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Err(ApiError::SessionExpired));
        assert_eq!(panel.items().len(), 1);
        assert!(panel.error().is_some());
    }

    #[tokio::test]
    async fn refresh_pulls_from_source() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        panel.refresh(&Fixed(vec![row("4", "d")])).await;
        assert_eq!(panel.state(), &PanelState::Ready);
        assert_eq!(panel.items(), &[row("4", "d")]);
    }

    #[test]
    fn write_after_failed_load_still_reports_the_load_error() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Err(ApiError::Decode("connection refused".to_string())));

        panel.begin_submit();
        assert!(panel.confirm_created(Ok(row("5", "e"))));
        assert_eq!(panel.items(), &[row("5", "e")]);
        assert!(panel.error().is_some_and(|message| message.contains("connection refused")));

        let ticket = panel.begin_load();
        panel.finish_load(ticket, Ok(vec![row("5", "e")]));
        panel.confirm_updated(Ok(row("5", "e2")));
        assert_eq!(panel.state(), &PanelState::Ready);
    }

    #[test]
    fn partial_write_keeps_what_was_stored() {
        let mut panel: ResourcePanel<Row> = ResourcePanel::new();
        let ticket = panel.begin_load();
        panel.finish_load(ticket, Ok(vec![row("1", "a")]));

        panel.begin_submit();
        panel.confirm_partial(vec![row("2", "b")], rejected());
        assert_eq!(panel.items(), &[row("1", "a"), row("2", "b")]);
        assert_eq!(panel.error(), Some("Lab session overlaps an existing booking"));
    }
}
