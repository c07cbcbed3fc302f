use crate::utils::*;
use bitflags::bitflags;
use clap::Args;
use gloo::timers::callback::{Interval, Timeout};
use minesweeper_core as game;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use web_sys::HtmlSelectElement;
use yew::html::Scope;
use yew::prelude::*;

impl StorageKey for game::Level {
    const KEY: &'static str = "minesweeper:level";
}

/// Scheduler backed by browser timers, fired events come back as [`Msg::Timer`].
#[derive(Clone)]
pub(crate) struct GlooScheduler {
    link: Scope<GameView>,
}

/// Keeps a browser timer armed, dropping it clears the timer.
pub(crate) enum GlooTimer {
    Interval(#[allow(dead_code)] Interval),
    Timeout(#[allow(dead_code)] Timeout),
}

/// How long a touch has to be held to toggle a flag.
const LONG_PRESS_MS: u32 = 1000;

impl game::Scheduler for GlooScheduler {
    type Handle = GlooTimer;

    fn repeat(&mut self, period_ms: u32, event: game::TimerEvent) -> Self::Handle {
        let link = self.link.clone();
        log::trace!("interval {}ms: {:?}", period_ms, event);
        GlooTimer::Interval(Interval::new(period_ms, move || {
            link.send_message(Msg::Timer(event))
        }))
    }

    fn once(&mut self, delay_ms: u32, event: game::TimerEvent) -> Self::Handle {
        let link = self.link.clone();
        GlooTimer::Timeout(Timeout::new(delay_ms, move || {
            link.send_message(Msg::Timer(event))
        }))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum ViewTileState {
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,
    Misflagged,
}

impl ViewTileState {
    fn of(tile: &game::Tile) -> Self {
        match (tile.is_opened(), tile.is_flagged(), tile.has_mine()) {
            (false, false, _) => Self::Hidden,
            (false, true, _) => Self::Flagged,
            (true, true, true) => Self::Flagged,
            (true, true, false) => Self::Misflagged,
            (true, false, true) => Self::Mine,
            (true, false, false) => Self::Revealed(tile.number()),
        }
    }

    /// A flag protects its tile from being opened.
    fn can_open(self) -> bool {
        self == Self::Hidden
    }

    fn can_flag(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }

    fn classes(self) -> Classes {
        use ViewTileState::*;
        match self {
            Hidden => classes!(),
            Flagged => classes!("flag"),
            Revealed(count) => classes!("open", format!("num-{}", count)),
            Mine => classes!("open", "mine"),
            Misflagged => classes!("flag", "wrong"),
        }
    }
}

fn face(state: game::GameState) -> &'static str {
    use game::GameState::*;
    match state {
        Completed => "😄",
        Dead => "😵",
        Initialized | Playing => "🙂",
    }
}

pub trait HasUpdate {
    fn has_update(self) -> bool;
}

impl HasUpdate for game::Result<game::MarkOutcome> {
    fn has_update(self) -> bool {
        match self {
            Ok(outcome) => outcome.has_update(),
            Err(err) => {
                log::warn!("rejected: {}", err);
                false
            }
        }
    }
}

impl HasUpdate for game::Result<game::RevealOutcome> {
    fn has_update(self) -> bool {
        match self {
            Ok(outcome) => outcome.has_update(),
            Err(err) => {
                log::warn!("rejected: {}", err);
                false
            }
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
    }
}

impl MouseButtons {
    /// The button behind a `mousedown`, synthetic ones from a tap report 0.
    fn pressed(button: i16) -> Self {
        match button {
            0 => Self::LEFT,
            2 => Self::RIGHT,
            _ => Self::empty(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Msg {
    Open(game::Coord2),
    Flag(game::Coord2),
    Timer(game::TimerEvent),
    Notify(game::GameEvent),
    Shuffle,
    NewGame,
    SelectLevel(game::Level),
}

#[derive(Properties, Clone, PartialEq)]
struct TileProps {
    x: game::Coord,
    y: game::Coord,
    tile_state: ViewTileState,
    #[prop_or_default]
    locked: bool,
    callback: Callback<Msg>,
}

/// What a press on a tile asks for, `None` when the tile takes no input.
fn press_msg(
    coords: game::Coord2,
    tile_state: ViewTileState,
    locked: bool,
    buttons: MouseButtons,
) -> Option<Msg> {
    if locked {
        None
    } else if buttons.contains(MouseButtons::RIGHT) {
        tile_state.can_flag().then_some(Msg::Flag(coords))
    } else if buttons.contains(MouseButtons::LEFT) {
        tile_state.can_open().then_some(Msg::Open(coords))
    } else {
        None
    }
}

#[function_component(TileView)]
fn tile_component(props: &TileProps) -> Html {
    let TileProps {
        x,
        y,
        tile_state,
        locked,
        callback,
    } = props.clone();

    let long_press = use_mut_ref(|| None::<Timeout>);

    let mut class = classes!("tile", tile_state.classes());
    if locked {
        class.push("locked");
    }

    let onmousedown = {
        let callback = callback.clone();
        Callback::from(move |e: MouseEvent| {
            let buttons = MouseButtons::pressed(e.button());
            log::trace!("({}, {}) mouse down ({:?})", x, y, buttons);
            if let Some(msg) = press_msg((x, y), tile_state, locked, buttons) {
                callback.emit(msg);
            }
        })
    };

    let ontouchstart = {
        let long_press = long_press.clone();
        Callback::from(move |_: TouchEvent| {
            let Some(msg) = press_msg((x, y), tile_state, locked, MouseButtons::RIGHT) else {
                return;
            };
            let callback = callback.clone();
            log::trace!("({}, {}) touch start", x, y);
            *long_press.borrow_mut() = Some(Timeout::new(LONG_PRESS_MS, move || {
                callback.emit(msg)
            }));
        })
    };

    // letting go early drops the pending timeout
    let ontouchend = Callback::from(move |_: TouchEvent| {
        long_press.borrow_mut().take();
    });
    let ontouchcancel = ontouchend.clone();

    let oncontextmenu = Callback::from(|e: MouseEvent| e.prevent_default());

    html! {
        <td {class} {onmousedown} {ontouchstart} {ontouchend} {ontouchcancel} {oncontextmenu}/>
    }
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub(crate) seed: Option<String>,
}

impl GameProps {
    fn seed(&self) -> u64 {
        match self.seed.as_deref().map(str::parse::<u64>) {
            Some(Ok(seed)) => seed,
            Some(Err(err)) => {
                log::warn!("ignoring seed {:?}: {}", self.seed, err);
                js_random_seed()
            }
            None => js_random_seed(),
        }
    }
}

pub(crate) struct GameView {
    level: game::Level,
    session: game::GameSession<GlooScheduler>,
}

impl GameView {
    fn create_session(
        ctx: &Context<Self>,
        level: game::Level,
        seed: u64,
    ) -> game::GameSession<GlooScheduler> {
        let scheduler = GlooScheduler {
            link: ctx.link().clone(),
        };
        let mut session =
            game::GameSession::new(level.game_config(), scheduler, SmallRng::seed_from_u64(seed))
                .expect("level presets are valid");

        let link = ctx.link().clone();
        session.set_listener(move |event| link.send_message(Msg::Notify(event)));
        session
    }

    fn reset(&mut self) -> bool {
        if let Err(err) = self.session.reconfigure(self.level.game_config()) {
            log::warn!("could not reset board: {}", err);
            return false;
        }
        true
    }

    fn view_level_select(&self, ctx: &Context<Self>) -> Html {
        if self.session.is_started() {
            return html! { <span>{self.level.caption()}</span> };
        }

        let onchange = ctx.link().batch_callback(|e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            select
                .value()
                .parse()
                .ok()
                .and_then(game::Level::from_index)
                .map(Msg::SelectLevel)
        });

        html! {
            <select {onchange}>
                {for game::Level::ALL.iter().enumerate().map(|(index, level)| html! {
                    <option
                        value={index.to_string()}
                        selected={*level == self.level}
                    >{level.caption()}</option>
                })}
            </select>
        }
    }

    fn view_board(&self, ctx: &Context<Self>) -> Html {
        let (width, _) = self.session.config().size;
        let locked = self.session.is_ended() || self.session.is_frozen();
        let callback = ctx.link().callback(|msg: Msg| msg);

        html! {
            <table class="board">
                {for self.session.tiles().chunks(usize::from(width)).map(|row| html! {
                    <tr>
                        {for row.iter().map(|tile| html! {
                            <TileView
                                x={tile.x()}
                                y={tile.y()}
                                tile_state={ViewTileState::of(tile)}
                                {locked}
                                callback={callback.clone()}
                            />
                        })}
                    </tr>
                })}
            </table>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let level = game::Level::local_or_default();
        let seed = ctx.props().seed();
        log::debug!("level: {:?}", level);
        Self {
            level,
            session: Self::create_session(ctx, level, seed),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Open(pos) => {
                log::debug!("open tile: {:?}", pos);
                self.session.open(pos).has_update()
            }
            Flag(pos) => {
                log::debug!("flag tile: {:?}", pos);
                self.session.toggle_flag(pos, None).has_update()
            }
            Timer(event) => {
                self.session.handle_timer(event);
                true
            }
            Notify(event) => {
                log::info!("game event: {:?}", event);
                true
            }
            Shuffle => self.session.reshuffle().has_update(),
            NewGame => self.reset(),
            SelectLevel(level) => {
                if self.session.is_started() || level == self.level {
                    return false;
                }
                self.level = level;
                level.local_save();
                self.reset()
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let state = self.session.state();
        let onshuffle = ctx.link().callback(|_: MouseEvent| Msg::Shuffle);
        let onnewgame = ctx.link().callback(|_: MouseEvent| Msg::NewGame);

        html! {
            <main>
                <nav>
                    <label>{"Level: "}</label>
                    {self.view_level_select(ctx)}
                    <button onclick={onnewgame}>{"New game"}</button>
                </nav>
                <header>
                    <span class="digits">{format!("{:03}", self.session.mines_left())}</span>
                    <button
                        class={classes!("face", state.is_ended().then_some("disabled"))}
                        disabled={state.is_ended()}
                        title="Shuffle"
                        onclick={onshuffle}
                    >{face(state)}</button>
                    <span class="digits">{format!("{:03}", self.session.elapsed_secs())}</span>
                </header>
                {self.view_board(ctx)}
            </main>
        }
    }
}
