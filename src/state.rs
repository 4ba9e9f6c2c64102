use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chart::ChartModel;
use crate::dataset::ObservationTable;
use crate::family::Family;
use crate::rounds::{self, AggregateError, SortPolicy};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    /// Dark background, navy/sky-blue palette, charts in a grid.
    #[default]
    Night,
    /// Light palette, charts stacked with the focused one enlarged.
    Club,
}

impl Theme {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "night" | "dark" => Some(Theme::Night),
            "club" | "light" => Some(Theme::Club),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Night => "NIGHT",
            Theme::Club => "CLUB",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Theme::Night => Theme::Club,
            Theme::Club => Theme::Night,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    /// No player selected yet.
    Empty,
    Ready(ChartModel),
    /// The table lacks a column this chart needs.
    Missing { column: String },
}

#[derive(Debug, Clone)]
pub struct ChartPanel {
    pub family: Family,
    pub sort: SortPolicy,
    pub round_cursor: usize,
    pub view: ChartView,
}

impl ChartPanel {
    fn new(family: Family) -> Self {
        Self {
            family,
            sort: SortPolicy::default(),
            round_cursor: 0,
            view: ChartView::Empty,
        }
    }

    pub fn model(&self) -> Option<&ChartModel> {
        match &self.view {
            ChartView::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn round_count(&self) -> usize {
        self.model().map(ChartModel::len).unwrap_or(0)
    }

    pub fn selected_detail(&self) -> Option<&[String]> {
        self.model()
            .and_then(|model| model.details.get(self.round_cursor))
            .map(Vec::as_slice)
    }
}

/// Everything the dashboard shows besides the table itself. Operations that
/// recompute charts borrow the table for the duration of the call.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub players: Vec<String>,
    pub player_cursor: usize,
    pub selected_player: Option<String>,
    pub focus: usize,
    pub panels: Vec<ChartPanel>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub theme: Theme,
}

impl DashboardState {
    pub fn new(players: Vec<String>, theme: Theme) -> Self {
        Self {
            players,
            player_cursor: 0,
            selected_player: None,
            focus: 0,
            panels: Family::ALL.into_iter().map(ChartPanel::new).collect(),
            logs: VecDeque::new(),
            help_overlay: false,
            theme,
        }
    }

    pub fn from_table(table: &ObservationTable, theme: Theme) -> Self {
        Self::new(table.players(), theme)
    }

    pub fn cursor_player(&self) -> Option<&str> {
        self.players.get(self.player_cursor).map(String::as_str)
    }

    pub fn next_player(&mut self) {
        if self.players.is_empty() {
            self.player_cursor = 0;
            return;
        }
        self.player_cursor = (self.player_cursor + 1) % self.players.len();
    }

    pub fn prev_player(&mut self) {
        if self.players.is_empty() {
            self.player_cursor = 0;
            return;
        }
        self.player_cursor = if self.player_cursor == 0 {
            self.players.len() - 1
        } else {
            self.player_cursor - 1
        };
    }

    /// Makes the player under the cursor current and recomputes every chart.
    pub fn select_player(&mut self, table: &ObservationTable) {
        let Some(player) = self.cursor_player().map(str::to_string) else {
            self.push_log("[INFO] No player to select");
            return;
        };
        self.push_log(format!("[INFO] Showing {player}"));
        self.selected_player = Some(player);
        for panel in &mut self.panels {
            panel.round_cursor = 0;
        }
        self.refresh_all(table);
    }

    pub fn clear_selection(&mut self) {
        self.selected_player = None;
        for panel in &mut self.panels {
            panel.view = ChartView::Empty;
            panel.round_cursor = 0;
        }
    }

    pub fn refresh_all(&mut self, table: &ObservationTable) {
        for family in Family::ALL {
            self.refresh_chart(table, family);
        }
    }

    pub fn refresh_chart(&mut self, table: &ObservationTable, family: Family) {
        let idx = family.index();
        let Some(player) = self.selected_player.clone() else {
            self.panels[idx].view = ChartView::Empty;
            return;
        };

        let rows = table.for_player(&player);
        let sort = self.panels[idx].sort;
        let view = match rounds::build(&rows, family, sort) {
            Ok(records) => {
                debug!(
                    player = %player,
                    family = family.slug(),
                    sort = sort.slug(),
                    rounds = records.len(),
                    "chart recomputed"
                );
                ChartView::Ready(ChartModel::build(family, &player, &records))
            }
            Err(AggregateError::MissingField { column, .. }) => {
                warn!(family = family.slug(), column = %column, "missing column");
                self.push_log(format!("[WARN] {family}: column `{column}` missing"));
                ChartView::Missing { column }
            }
        };

        let panel = &mut self.panels[idx];
        panel.view = view;
        let rounds = panel.round_count();
        if panel.round_cursor >= rounds {
            panel.round_cursor = rounds.saturating_sub(1);
        }
    }

    pub fn focused_panel(&self) -> &ChartPanel {
        &self.panels[self.focus]
    }

    pub fn focus_chart(&mut self, idx: usize) {
        if idx < self.panels.len() {
            self.focus = idx;
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.panels.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = if self.focus == 0 {
            self.panels.len() - 1
        } else {
            self.focus - 1
        };
    }

    /// Sets the focused chart's policy and recomputes only that chart.
    pub fn set_sort(&mut self, table: &ObservationTable, sort: SortPolicy) {
        let family = self.panels[self.focus].family;
        self.panels[self.focus].sort = sort;
        self.panels[self.focus].round_cursor = 0;
        self.refresh_chart(table, family);
    }

    pub fn next_round(&mut self) {
        let panel = &mut self.panels[self.focus];
        let total = panel.round_count();
        if total == 0 {
            panel.round_cursor = 0;
            return;
        }
        panel.round_cursor = (panel.round_cursor + 1) % total;
    }

    pub fn prev_round(&mut self) {
        let panel = &mut self.panels[self.focus];
        let total = panel.round_count();
        if total == 0 {
            panel.round_cursor = 0;
            return;
        }
        panel.round_cursor = if panel.round_cursor == 0 {
            total - 1
        } else {
            panel.round_cursor - 1
        };
    }

    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
