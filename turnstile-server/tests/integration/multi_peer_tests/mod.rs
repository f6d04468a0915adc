mod test_closed_session_frees_gate;
mod test_queue_positions;
