/// Note lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyState {
    /// Just triggered; becomes `Sustained` after one tick
    Attacking,
    /// Key held
    Sustained,
    /// Key released (note-off)
    Released,
    /// Volume fading out
    Fadeout,
    /// Silent, waiting to be retired
    Stopped,
}

/// Key transition whose effect on the sample voicer waits until the
/// envelopes have been advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    Attack,
    Release,
}

/// Key-state machine of a voice.
#[derive(Clone, Debug)]
pub struct KeyModulator {
    state: KeyState,
    deferred: Option<Deferred>,
}

impl Default for KeyModulator {
    /// An idle key: released, nothing pending.
    fn default() -> Self {
        Self {
            state: KeyState::Released,
            deferred: None,
        }
    }
}

impl KeyModulator {
    pub fn state(&self) -> KeyState {
        self.state
    }

    /// Attacking or sustained.
    pub fn is_key_on(&self) -> bool {
        matches!(self.state, KeyState::Attacking | KeyState::Sustained)
    }

    pub fn is_fadeout(&self) -> bool {
        self.state == KeyState::Fadeout
    }

    pub fn is_stopped(&self) -> bool {
        self.state == KeyState::Stopped
    }

    /// Press the key. Always succeeds, even from `Stopped`.
    pub fn attack(&mut self) {
        self.state = KeyState::Attacking;
        self.deferred = Some(Deferred::Attack);
    }

    /// Release a held key. Returns false if the key was not held.
    pub fn release(&mut self) -> bool {
        if !self.is_key_on() {
            return false;
        }
        self.state = KeyState::Released;
        self.deferred = Some(Deferred::Release);
        true
    }

    /// Enter fadeout. Returns false if already fading or stopped.
    pub fn fadeout(&mut self) -> bool {
        match self.state {
            KeyState::Fadeout | KeyState::Stopped => false,
            _ => {
                self.state = KeyState::Fadeout;
                true
            }
        }
    }

    pub fn stop(&mut self) {
        self.state = KeyState::Stopped;
        self.deferred = None;
    }

    /// Take the pending voicer transition, if any.
    pub fn take_deferred(&mut self) -> Option<Deferred> {
        self.deferred.take()
    }

    /// End-of-tick step: an attack becomes a sustain.
    pub fn advance(&mut self) {
        if self.state == KeyState::Attacking {
            self.state = KeyState::Sustained;
        }
    }
}
