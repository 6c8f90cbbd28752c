/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

pub const DEFAULT_SOLVER_TIME_BUDGET_MILLIS: u64 = 100;

#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub solver_time_budget_millis: u64,
}

impl TraversalOptions {
    pub fn solver_time_budget(&self) -> Duration {
        Duration::from_millis(self.solver_time_budget_millis)
    }
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self { solver_time_budget_millis: DEFAULT_SOLVER_TIME_BUDGET_MILLIS }
    }
}
