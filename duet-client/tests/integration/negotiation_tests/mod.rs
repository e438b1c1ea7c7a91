mod test_candidates;
mod test_deferred_renegotiation;
mod test_glare;
mod test_media_denied;
