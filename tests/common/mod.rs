pub mod nba_server;
