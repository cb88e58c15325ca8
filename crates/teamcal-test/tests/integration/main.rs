mod expansion;
mod helpers;
mod import_flow;
mod series_flow;
