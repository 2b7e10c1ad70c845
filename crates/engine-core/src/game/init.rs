use super::*;

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let rng_state = mix_word(config.seed);
        Self {
            name: config.game_id.clone(),
            description: config.notes.clone().unwrap_or_default(),
            rules: Vec::new(),
            players: Vec::new(),
            variables: Vec::new(),
            events: Vec::new(),
            outputs: Vec::new(),
            victory: None,
            log: Vec::new(),
            current_tick: 0,
            rng_state,
            trigger_depth: 0,
            config,
        }
    }
}
