mod advance;
mod batting;
mod duckdb_impl;
mod game;
mod inherited;
mod innings;
mod log;
mod pitching;
mod reader;
mod rows;
mod season;
mod tenure;
mod types;
mod warnings;

#[cfg(test)]
mod testing;

use advance::{RetrosheetAdvancesJsonScalar, RetrosheetUnearnedRunsScalar};
use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use reader::{ReadSeasonVTab, StarterRows, TeamRows};
use std::error::Error;

#[duckdb_extension(name = "duckdb_retrosheet", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadSeasonVTab<TeamRows>>("read_retrosheet_teams")?;
    con.register_table_function::<ReadSeasonVTab<StarterRows>>("read_retrosheet_starters")?;

    // Scalar functions
    con.register_scalar_function::<RetrosheetAdvancesJsonScalar>("retrosheet_advances_json")?;
    con.register_scalar_function::<RetrosheetUnearnedRunsScalar>("retrosheet_unearned_runs")?;

    Ok(())
}
