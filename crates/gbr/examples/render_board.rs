use gbr::{Board, BoardInfoImage, RenderOnlyEngine};

#[cfg(feature = "tracing")]
use gbr::core::init_tracing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    gbr::core::init_with_level(log::LevelFilter::Info)?;

    let mut args = std::env::args().skip(1);
    let (Some(jgf), Some(out)) = (args.next(), args.next()) else {
        eprintln!("Usage: render_board <board.jgf> <out.png>");
        return Ok(());
    };

    let mut board = Board::new(RenderOnlyEngine);
    let results = board.load_board_info(&jgf, BoardInfoImage::Generated)?;
    println!(
        "{} black, {} white stones on a {:?} board",
        results.black.len(),
        results.white.len(),
        results.board_size()
    );

    let shape = board.board_shape().ok_or("no board image")?;
    let img = gbr::render_board(shape, Some(&results), true);
    img.save(&out)?;
    println!("wrote {out}");
    Ok(())
}
