pub mod handicap_reconcile_runner;
