//! Built-in Glicol composition used when no microphone is requested.

/// Procedural bass groove: a sparse kick-register saw line with a slow
/// filter sweep. Tuned so the 120-250 Hz beat band gets clear transients
/// for the wave trigger to latch onto.
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 36 _36 _~n 24
~n: choose 36 36 48 0 0
~amp: ~gate >> envperc 0.001 0.25
~pit: ~gate >> mul 65.41
~bass: saw ~pit >> mul ~amp >> lpf ~sweep 4.0 >> mul 0.12
~sweep: sin 0.15 >> mul 600 >> add 800
o: ~bass >> plate 0.08
"#;
