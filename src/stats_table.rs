use std::cmp::Ordering;

use crate::models_api::player_stats::ApiPlayerStat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Team,
    Position,
    Points,
    Rebounds,
    Assists,
    Games,
}

impl SortField {
    pub fn is_numeric(&self) -> bool {
        matches!(self, SortField::Points | SortField::Rebounds | SortField::Assists | SortField::Games)
    }

    /// Direction used when a column is picked for the first time.
    pub fn default_direction(&self) -> SortDirection {
        if self.is_numeric() {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    fn compare(&self, a: &ApiPlayerStat, b: &ApiPlayerStat) -> Ordering {
        match self {
            SortField::Name => cmp_text(&a.name, &b.name),
            SortField::Team => cmp_text(&a.team, &b.team),
            SortField::Position => cmp_text(&a.position, &b.position),
            SortField::Points => a.points.total_cmp(&b.points),
            SortField::Rebounds => a.rebounds.total_cmp(&b.rebounds),
            SortField::Assists => a.assists.total_cmp(&b.assists),
            SortField::Games => a.games.cmp(&b.games),
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    /// Same column flips, a new column starts at its default direction.
    pub fn toggle(current: Option<SortState>, field: SortField) -> SortState {
        match current {
            Some(state) if state.field == field => SortState { field, direction: state.direction.flip() },
            _ => SortState { field, direction: field.default_direction() },
        }
    }
}

/// Stable sort. Descending reverses the comparator rather than the rows,
/// so equal keys keep their previous relative order either way.
pub fn sort_stats(rows: &mut [ApiPlayerStat], state: SortState) {
    rows.sort_by(|a, b| {
        let ordering = state.field.compare(a, b);
        match state.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// The player statistics view: the full fetched list plus the active sort.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    rows: Vec<ApiPlayerStat>,
    sort: Option<SortState>,
}

impl StatsTable {
    pub fn new(rows: Vec<ApiPlayerStat>) -> StatsTable {
        StatsTable { rows, sort: None }
    }

    /// Column header click.
    pub fn click(&mut self, field: SortField) -> SortState {
        let state = SortState::toggle(self.sort, field);
        sort_stats(&mut self.rows, state);
        self.sort = Some(state);
        state
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    pub fn rows(&self) -> &[ApiPlayerStat] {
        &self.rows
    }

    /// Rows whose name or team contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&ApiPlayerStat> {
        let query = query.to_lowercase();
        self.rows.iter()
            .filter(|e| query.is_empty()
                || e.name.to_lowercase().contains(&query)
                || e.team.to_lowercase().contains(&query))
            .collect()
    }
}
