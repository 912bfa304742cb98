//! Scenario tests driving controls through fake collaborators.


mod detached;
mod dialogs;
mod sizing;
mod values;
