//! Generic bidirectional keyset pagination engine.
//!
//! # Flow
//!
//! 1. Resolve the boundary record named by the cursor (if any)
//! 2. Build the page filter and ordering around the boundary
//! 3. Fetch `limit + 1` records from the collection
//! 4. Restore canonical order when travelling backward
//! 5. Emit fresh cursors from the first and last records
//!
//! Any error short-circuits the remaining steps. The engine holds no
//! state between requests.

use tracing::{Span, debug, instrument, warn};

use crate::error::{PaginationError, PaginationResult, Stage};
use crate::metrics::{PageTimer, record_cursor_not_found, record_page_served};
use crate::ports::{
    Collection, Cursor, Entity, Filter, OrderDirection, Page, PageInfo, PagingState, SortField,
    Travel, Value,
};

use super::sort::{SortSpec, SortTable};

// =============================================================================
// Boundary Resolver
// =============================================================================

/// Sort-key value and identifier extracted from a boundary record.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub id: String,
    pub value: Value,
}

impl Boundary {
    /// Extract the value of the sort key from `record`.
    ///
    /// A record lacking the field is treated as holding null.
    pub fn extract<E: Entity>(record: &E, spec: &SortSpec) -> Self {
        Self {
            id: record.id().to_string(),
            value: record.field(spec.key.field).unwrap_or(Value::Null),
        }
    }
}

/// Load the record named by `cursor`.
///
/// Returns `Ok(None)` without touching the store when there is no cursor.
/// A cursor naming a missing record is a [`PaginationError::NotFound`]:
/// falling back to the first page would silently restart the walk.
pub async fn resolve_boundary<E: Entity>(
    collection: &dyn Collection<E>,
    cursor: Option<&Cursor>,
) -> PaginationResult<Option<E>> {
    let Some(cursor) = cursor else {
        return Ok(None);
    };

    let record = collection
        .find_by_id(cursor.as_str())
        .await
        .map_err(PaginationError::at(Stage::Resolve))?;

    match record {
        Some(record) => Ok(Some(record)),
        None => {
            record_cursor_not_found(E::COLLECTION);
            warn!(cursor = %cursor, "Boundary record vanished");
            Err(PaginationError::NotFound {
                collection: E::COLLECTION,
                cursor: cursor.value.clone(),
            })
        }
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// Store-level description of one page fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub filter: Filter,
    pub order: Vec<SortField>,
    /// Number of records the caller asked for. The executor fetches one more.
    pub limit: usize,
    /// Whether `order` is the inverse of the canonical order.
    pub inverted: bool,
}

/// Selects records lying strictly after `boundary` in the order `spec`.
///
/// The key and the tiebreaker are compared as a pair, so records sharing
/// the boundary's key value are split by identifier. Nulls sort before
/// every value: in ascending order they precede any non-null boundary and
/// in descending order they follow it.
fn boundary_filter(spec: &SortSpec, boundary: &Boundary) -> Filter {
    let field = spec.key.field;
    let past = spec.past_boundary();
    let past_id = Filter::compare(spec.tiebreaker, past, boundary.id.as_str());
    if field == spec.tiebreaker {
        return past_id;
    }

    let value = boundary.value.clone();
    match (spec.key.direction, value.is_null()) {
        (OrderDirection::Asc, true) => Filter::Or(vec![
            Filter::NotNull(field),
            Filter::IsNull(field).and(past_id),
        ]),
        (OrderDirection::Desc, true) => Filter::IsNull(field).and(past_id),
        (OrderDirection::Asc, false) => Filter::Or(vec![
            Filter::compare(field, past, value.clone()),
            Filter::eq(field, value).and(past_id),
        ]),
        (OrderDirection::Desc, false) => Filter::Or(vec![
            Filter::compare(field, past, value.clone()),
            Filter::IsNull(field),
            Filter::eq(field, value).and(past_id),
        ]),
    }
}

/// Build the filter and ordering for one page.
///
/// - First page: the base filter in canonical order.
/// - Forward: records past the boundary's `(key, id)` pair, canonical order.
/// - Backward: the same around the inverted order, so the store returns
///   the records nearest the boundary first.
pub fn build_query(
    base: &Filter,
    spec: &SortSpec,
    travel: Travel,
    boundary: Option<&Boundary>,
    limit: u32,
) -> PageQuery {
    let (effective, inverted) = match travel {
        Travel::Backward => (spec.inverse(), true),
        Travel::First | Travel::Forward => (*spec, false),
    };

    let filter = match boundary {
        None => base.clone(),
        Some(boundary) => base.clone().and(boundary_filter(&effective, boundary)),
    };

    PageQuery {
        filter,
        order: effective.order(),
        limit: limit as usize,
        inverted: boundary.is_some() && inverted,
    }
}

// =============================================================================
// Page Executor
// =============================================================================

/// Run `query`, returning at most `query.limit` records in store order and
/// whether more records exist in the travel direction.
pub async fn execute<E: Entity>(
    collection: &dyn Collection<E>,
    query: &PageQuery,
) -> PaginationResult<(Vec<E>, bool)> {
    let mut records = collection
        .query(&query.filter, &query.order, query.limit + 1)
        .await
        .map_err(PaginationError::at(Stage::Query))?;

    let has_more = records.len() > query.limit;
    records.truncate(query.limit);
    Ok((records, has_more))
}

// =============================================================================
// Result Normalizer
// =============================================================================

/// Put a fetched slice back into canonical order.
pub fn normalize<E>(records: &mut [E], query: &PageQuery) {
    if query.inverted {
        records.reverse();
    }
}

// =============================================================================
// Cursor Emitter
// =============================================================================

/// Neighbour information for a page fetched in `travel` direction.
///
/// A page reached by travelling forward has the boundary before it, one
/// reached backward has the boundary after it. The lookahead record tells
/// about the other side.
pub fn page_info(travel: Travel, has_more: bool) -> PageInfo {
    match travel {
        Travel::First => PageInfo {
            has_next_page: has_more,
            has_previous_page: false,
        },
        Travel::Forward => PageInfo {
            has_next_page: has_more,
            has_previous_page: true,
        },
        Travel::Backward => PageInfo {
            has_next_page: true,
            has_previous_page: has_more,
        },
    }
}

/// Derive the response paging state from a normalized page.
///
/// `next_cursor` is the last record and `prev_cursor` the first. A first
/// page always carries `prev_cursor`, so a newest-first feed can ask for
/// records inserted above it. Otherwise a side known to be exhausted gets
/// no cursor, and an empty page clears both. Never touches the store.
pub fn emit_cursors<E: Entity>(
    records: &[E],
    request: &PagingState,
    info: PageInfo,
    total: u64,
) -> PagingState {
    let keep_previous = info.has_previous_page || request.travel() == Travel::First;
    let (forward_cursor, backward_cursor) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (
            info.has_next_page.then(|| Cursor::from(last.id())),
            keep_previous.then(|| Cursor::from(first.id())),
        ),
        _ => (None, None),
    };

    PagingState {
        forward_cursor,
        backward_cursor,
        limit: request.limit,
        total,
    }
}

// =============================================================================
// Paginator
// =============================================================================

/// Pagination engine bound to one collection and its sort table.
pub struct Paginator<'a, E: Entity> {
    collection: &'a dyn Collection<E>,
    table: &'a SortTable,
}

impl<'a, E: Entity> Paginator<'a, E> {
    pub fn new(collection: &'a dyn Collection<E>, table: &'a SortTable) -> Self {
        Self { collection, table }
    }

    /// Fetch one page of `base`, sorted by `sort_token`.
    ///
    /// `paging` carries at most one cursor and a positive limit. The
    /// returned page holds the records in canonical order, the new cursors
    /// and the number of records matching `base`.
    #[instrument(
        name = "paginate",
        skip(self, base, paging),
        fields(collection = E::COLLECTION, travel = tracing::field::Empty)
    )]
    pub async fn paginate(
        &self,
        base: Filter,
        sort_token: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<E>> {
        validate(&paging)?;

        let travel = paging.travel();
        Span::current().record("travel", travel.as_str());
        let spec = self.table.resolve(sort_token);
        let _timer = PageTimer::new(E::COLLECTION);

        let cursor = paging
            .forward_cursor
            .as_ref()
            .or(paging.backward_cursor.as_ref());
        let boundary = resolve_boundary(self.collection, cursor)
            .await?
            .map(|record| Boundary::extract(&record, &spec));

        let query = build_query(&base, &spec, travel, boundary.as_ref(), paging.limit);
        debug!(
            field = spec.key.field,
            direction = ?query.order.first().map(|s| s.direction),
            inverted = query.inverted,
            "Page query built"
        );

        let (mut records, has_more) = execute(self.collection, &query).await?;
        normalize(&mut records, &query);

        let total = self
            .collection
            .count(&base)
            .await
            .map_err(PaginationError::at(Stage::Count))?;

        let page_info = page_info(travel, has_more);
        let paging = emit_cursors(&records, &paging, page_info, total);

        debug!(
            returned = records.len(),
            total,
            has_next = page_info.has_next_page,
            has_previous = page_info.has_previous_page,
            "Page emitted"
        );
        record_page_served(E::COLLECTION, travel.as_str());

        Ok(Page {
            records,
            paging,
            page_info,
        })
    }
}

/// Reject requests the engine cannot serve.
fn validate(paging: &PagingState) -> PaginationResult<()> {
    if paging.limit == 0 {
        return Err(PaginationError::InvalidArgument(
            "limit must be a positive integer".into(),
        ));
    }
    if paging.forward_cursor.is_some() && paging.backward_cursor.is_some() {
        return Err(PaginationError::InvalidArgument(
            "next_cursor and prev_cursor are mutually exclusive".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Comparison, ID_FIELD};
    use crate::services::sort::SortKey;

    fn spec_desc() -> SortSpec {
        SortSpec::new(SortKey::desc("reg_time"))
    }

    fn boundary(value: i64) -> Boundary {
        Boundary {
            id: "c".into(),
            value: Value::Int(value),
        }
    }

    #[test]
    fn test_first_page_uses_base_filter_and_canonical_order() {
        let base = Filter::eq("author", "alice");
        let query = build_query(&base, &spec_desc(), Travel::First, None, 2);

        assert_eq!(query.filter, base);
        assert_eq!(
            query.order,
            vec![SortField::desc("reg_time"), SortField::desc(ID_FIELD)]
        );
        assert_eq!(query.limit, 2);
        assert!(!query.inverted);
    }

    #[test]
    fn test_forward_query_excludes_boundary() {
        let query = build_query(&Filter::All, &spec_desc(), Travel::Forward, Some(&boundary(3)), 2);

        assert_eq!(
            query.filter,
            Filter::Or(vec![
                Filter::compare("reg_time", Comparison::Lt, 3_i64),
                Filter::IsNull("reg_time"),
                Filter::And(vec![
                    Filter::eq("reg_time", 3_i64),
                    Filter::compare(ID_FIELD, Comparison::Lt, "c"),
                ]),
            ])
        );
        assert!(!query.inverted);
    }

    // Test critique: en arrière, l'ordre est inversé et le résultat sera retourné
    #[test]
    fn test_backward_query_inverts_order() {
        let base = Filter::eq("author", "alice");
        let query = build_query(&base, &spec_desc(), Travel::Backward, Some(&boundary(3)), 2);

        assert_eq!(
            query.filter,
            Filter::And(vec![
                Filter::eq("author", "alice"),
                Filter::Or(vec![
                    Filter::compare("reg_time", Comparison::Gt, 3_i64),
                    Filter::And(vec![
                        Filter::eq("reg_time", 3_i64),
                        Filter::compare(ID_FIELD, Comparison::Gt, "c"),
                    ]),
                ]),
            ])
        );
        assert_eq!(
            query.order,
            vec![SortField::asc("reg_time"), SortField::asc(ID_FIELD)]
        );
        assert!(query.inverted);
    }

    #[test]
    fn test_null_boundary_value() {
        let null_boundary = Boundary {
            id: "x".into(),
            value: Value::Null,
        };
        let asc = SortSpec::new(SortKey::asc("birth"));

        let forward = build_query(&Filter::All, &asc, Travel::Forward, Some(&null_boundary), 5);
        assert_eq!(
            forward.filter,
            Filter::Or(vec![
                Filter::NotNull("birth"),
                Filter::And(vec![
                    Filter::IsNull("birth"),
                    Filter::compare(ID_FIELD, Comparison::Gt, "x"),
                ]),
            ]),
            "every value and the later nulls follow a null in ascending order"
        );

        let backward = build_query(&Filter::All, &asc, Travel::Backward, Some(&null_boundary), 5);
        assert_eq!(
            backward.filter,
            Filter::And(vec![
                Filter::IsNull("birth"),
                Filter::compare(ID_FIELD, Comparison::Lt, "x"),
            ])
        );
    }

    #[test]
    fn test_sorting_by_id_compares_id_once() {
        let by_id = SortSpec::new(SortKey::asc(ID_FIELD));
        let boundary = Boundary {
            id: "c".into(),
            value: Value::Text("c".into()),
        };

        let query = build_query(&Filter::All, &by_id, Travel::Forward, Some(&boundary), 5);
        assert_eq!(query.filter, Filter::compare(ID_FIELD, Comparison::Gt, "c"));
    }

    #[test]
    fn test_normalize_reverses_only_inverted() {
        let mut query = build_query(&Filter::All, &spec_desc(), Travel::Forward, Some(&boundary(1)), 3);
        let mut records = vec![1, 2, 3];
        normalize(&mut records, &query);
        assert_eq!(records, vec![1, 2, 3]);

        query.inverted = true;
        normalize(&mut records, &query);
        assert_eq!(records, vec![3, 2, 1]);

        let mut empty: Vec<i32> = Vec::new();
        normalize(&mut empty, &query);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_page_info_by_travel() {
        assert_eq!(
            page_info(Travel::First, true),
            PageInfo {
                has_next_page: true,
                has_previous_page: false
            }
        );
        assert_eq!(
            page_info(Travel::Forward, false),
            PageInfo {
                has_next_page: false,
                has_previous_page: true
            }
        );
        assert_eq!(
            page_info(Travel::Backward, false),
            PageInfo {
                has_next_page: true,
                has_previous_page: false
            }
        );
    }

    #[test]
    fn test_validate_rejects_zero_limit_and_two_cursors() {
        assert!(matches!(
            validate(&PagingState::first(0)),
            Err(PaginationError::InvalidArgument(_))
        ));

        let mut both = PagingState::after("a", 5);
        both.backward_cursor = Some("b".into());
        assert!(matches!(
            validate(&both),
            Err(PaginationError::InvalidArgument(_))
        ));

        assert!(validate(&PagingState::before("b", 5)).is_ok());
    }

    // =========================================================================
    // Engine walks over an in-process collection
    // =========================================================================

    use async_trait::async_trait;

    use crate::error::{StorageError, StorageResult};
    use crate::memory::MemoryCollection;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        rank: Option<i64>,
    }

    impl Entity for Item {
        const COLLECTION: &'static str = "items";

        fn id(&self) -> &str {
            self.id
        }

        fn field(&self, name: &str) -> Option<Value> {
            match name {
                ID_FIELD => Some(self.id.into()),
                "rank" => Some(self.rank.into()),
                _ => None,
            }
        }
    }

    fn item(id: &'static str, rank: i64) -> Item {
        Item {
            id,
            rank: Some(rank),
        }
    }

    /// A..E ranked 1..5.
    fn alphabet() -> MemoryCollection<Item> {
        ["A", "B", "C", "D", "E"]
            .into_iter()
            .zip(1..)
            .map(|(id, rank)| item(id, rank))
            .collect()
    }

    fn rank_table() -> SortTable {
        SortTable::new(SortKey::desc("rank")).with("rank", SortKey::asc("rank"))
    }

    fn ids(page: &Page<Item>) -> Vec<&'static str> {
        page.records.iter().map(|r| r.id).collect()
    }

    fn next(page: &Page<Item>) -> Option<&str> {
        page.paging.forward_cursor.as_ref().map(Cursor::as_str)
    }

    fn prev(page: &Page<Item>) -> Option<&str> {
        page.paging.backward_cursor.as_ref().map(Cursor::as_str)
    }

    // Test critique: le parcours complet avant puis arrière
    #[tokio::test]
    async fn test_walk_forward_and_back() {
        let items = alphabet();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        let first = paginator
            .paginate(Filter::All, "", PagingState::first(2))
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["E", "D"]);
        assert_eq!(next(&first), Some("D"));
        assert_eq!(prev(&first), Some("E"), "a first page can still look above itself");
        assert!(!first.page_info.has_previous_page);
        assert_eq!(first.total(), 5);
        assert_eq!(first.paging.limit, 2);

        let second = paginator
            .paginate(Filter::All, "", PagingState::after("D", 2))
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["C", "B"]);
        assert_eq!(next(&second), Some("B"));
        assert_eq!(prev(&second), Some("C"));

        let last = paginator
            .paginate(Filter::All, "", PagingState::after("B", 2))
            .await
            .unwrap();
        assert_eq!(ids(&last), vec!["A"]);
        assert_eq!(next(&last), None, "forward side is exhausted");
        assert_eq!(prev(&last), Some("A"));
        assert!(!last.page_info.has_next_page);

        let back = paginator
            .paginate(Filter::All, "", PagingState::before("C", 2))
            .await
            .unwrap();
        assert_eq!(ids(&back), vec!["E", "D"], "canonical order after inversion");
        assert_eq!(next(&back), Some("D"));
        assert_eq!(prev(&back), None, "backward side is exhausted");
    }

    #[tokio::test]
    async fn test_forward_walk_visits_every_record_once() {
        let items = alphabet();
        items.upsert(Item { id: "N", rank: None }).unwrap();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        for token in ["", "rank"] {
            let mut seen = Vec::new();
            let mut paging = PagingState::first(2);
            loop {
                let page = paginator.paginate(Filter::All, token, paging).await.unwrap();
                seen.extend(ids(&page));
                match page.paging.forward_cursor {
                    Some(cursor) => paging = PagingState::after(cursor, 2),
                    None => break,
                }
            }
            let expected = if token.is_empty() {
                vec!["E", "D", "C", "B", "A", "N"]
            } else {
                vec!["N", "A", "B", "C", "D", "E"]
            };
            assert_eq!(seen, expected, "sort token {token:?}");
        }
    }

    #[tokio::test]
    async fn test_backward_walk_mirrors_forward_walk() {
        let items = alphabet();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        let mut seen = Vec::new();
        let mut paging = PagingState::before("A", 2);
        loop {
            let page = paginator.paginate(Filter::All, "", paging).await.unwrap();
            let mut batch = ids(&page);
            batch.extend(seen);
            seen = batch;
            match page.paging.backward_cursor {
                Some(cursor) => paging = PagingState::before(cursor, 2),
                None => break,
            }
        }
        assert_eq!(seen, vec!["E", "D", "C", "B"]);
    }

    /// Three records tied on rank 5, one on rank 1 and two nulls.
    fn tied() -> MemoryCollection<Item> {
        [
            item("X", 5),
            item("Y", 5),
            item("W", 5),
            item("Z", 1),
            Item { id: "N", rank: None },
            Item { id: "M", rank: None },
        ]
        .into_iter()
        .collect()
    }

    async fn walk_forward(paginator: &Paginator<'_, Item>, token: &str) -> Vec<&'static str> {
        let mut seen = Vec::new();
        let mut paging = PagingState::first(1);
        for _ in 0..10 {
            let page = paginator.paginate(Filter::All, token, paging).await.unwrap();
            seen.extend(ids(&page));
            match page.paging.forward_cursor {
                Some(cursor) => paging = PagingState::after(cursor, 1),
                None => return seen,
            }
        }
        panic!("forward walk did not end: {seen:?}");
    }

    async fn walk_backward(
        paginator: &Paginator<'_, Item>,
        token: &str,
        from: &str,
    ) -> Vec<&'static str> {
        let mut seen = Vec::new();
        let mut paging = PagingState::before(from, 1);
        for _ in 0..10 {
            let page = paginator.paginate(Filter::All, token, paging).await.unwrap();
            let mut batch = ids(&page);
            batch.extend(seen);
            seen = batch;
            match page.paging.backward_cursor {
                Some(cursor) => paging = PagingState::before(cursor, 1),
                None => return seen,
            }
        }
        panic!("backward walk did not end: {seen:?}");
    }

    // Test critique: un groupe d'égalité plus grand que la page ne doit pas boucler
    #[tokio::test]
    async fn test_tie_group_larger_than_page_walks_forward_once() {
        let items = tied();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        assert_eq!(
            walk_forward(&paginator, "").await,
            vec!["Y", "X", "W", "Z", "N", "M"]
        );
        assert_eq!(
            walk_forward(&paginator, "rank").await,
            vec!["M", "N", "Z", "W", "X", "Y"]
        );
    }

    #[tokio::test]
    async fn test_tie_group_larger_than_page_walks_backward_once() {
        let items = tied();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        assert_eq!(
            walk_backward(&paginator, "", "M").await,
            vec!["Y", "X", "W", "Z", "N"]
        );
        assert_eq!(
            walk_backward(&paginator, "rank", "Y").await,
            vec!["M", "N", "Z", "W", "X"]
        );
    }

    #[tokio::test]
    async fn test_null_boundary_in_both_directions() {
        let items = alphabet();
        items.upsert(Item { id: "N", rank: None }).unwrap();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        // Descending: nulls come last.
        let tail = paginator
            .paginate(Filter::All, "", PagingState::before("N", 2))
            .await
            .unwrap();
        assert_eq!(ids(&tail), vec!["B", "A"]);

        // Ascending: nulls come first.
        let head = paginator
            .paginate(Filter::All, "rank", PagingState::after("N", 2))
            .await
            .unwrap();
        assert_eq!(ids(&head), vec!["A", "B"]);
        let before_a = paginator
            .paginate(Filter::All, "rank", PagingState::before("A", 2))
            .await
            .unwrap();
        assert_eq!(ids(&before_a), vec!["N"]);
    }

    #[tokio::test]
    async fn test_deleted_boundary_is_not_found() {
        let items = alphabet();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        let first = paginator
            .paginate(Filter::All, "", PagingState::first(2))
            .await
            .unwrap();
        let cursor = first.paging.forward_cursor.clone().unwrap();
        assert!(items.remove(cursor.as_str()).unwrap());

        let err = paginator
            .paginate(Filter::All, "", PagingState::after(cursor, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, PaginationError::NotFound { collection: "items", .. }));
    }

    #[tokio::test]
    async fn test_same_request_same_page() {
        let items = alphabet();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        let a = paginator
            .paginate(Filter::All, "", PagingState::after("D", 2))
            .await
            .unwrap();
        let b = paginator
            .paginate(Filter::All, "", PagingState::after("D", 2))
            .await
            .unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.paging, b.paging);
    }

    #[tokio::test]
    async fn test_empty_page_clears_cursors_and_counts_base() {
        let items = alphabet();
        let table = rank_table();
        let paginator = Paginator::new(&items, &table);

        let page = paginator
            .paginate(Filter::gt("rank", 10_i64), "", PagingState::first(2))
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.paging.forward_cursor, None);
        assert_eq!(page.paging.backward_cursor, None);
        assert_eq!(page.total(), 0);

        // The count ignores the boundary.
        let filtered = paginator
            .paginate(Filter::gt("rank", 2_i64), "", PagingState::after("D", 10))
            .await
            .unwrap();
        assert_eq!(ids(&filtered), vec!["C"]);
        assert_eq!(filtered.total(), 3);
    }

    /// Collection failing at one stage.
    struct BrokenCollection {
        inner: MemoryCollection<Item>,
        broken: Stage,
    }

    impl BrokenCollection {
        fn check(&self, stage: Stage) -> StorageResult<()> {
            if self.broken == stage {
                return Err(StorageError::QueryError("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Collection<Item> for BrokenCollection {
        async fn find_by_id(&self, id: &str) -> StorageResult<Option<Item>> {
            self.check(Stage::Resolve)?;
            self.inner.find_by_id(id).await
        }

        async fn query(
            &self,
            filter: &Filter,
            sort: &[SortField],
            limit: usize,
        ) -> StorageResult<Vec<Item>> {
            self.check(Stage::Query)?;
            self.inner.query(filter, sort, limit).await
        }

        async fn count(&self, filter: &Filter) -> StorageResult<u64> {
            self.check(Stage::Count)?;
            self.inner.count(filter).await
        }
    }

    #[tokio::test]
    async fn test_storage_failure_names_stage() {
        let table = rank_table();
        for broken in [Stage::Resolve, Stage::Query, Stage::Count] {
            let items = BrokenCollection {
                inner: alphabet(),
                broken,
            };
            let err = Paginator::new(&items, &table)
                .paginate(Filter::All, "", PagingState::after("D", 2))
                .await
                .unwrap_err();
            assert!(matches!(err, PaginationError::Storage { .. }));
            assert_eq!(err.stage(), Some(broken));
        }
    }
}
