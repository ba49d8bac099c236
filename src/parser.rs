use crate::families::Family;
use crate::HomError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, space0},
    combinator::{all_consuming, map, map_res, opt},
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
    IResult,
};

/// Parse a single unsigned integer
fn parse_usize(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn parse_u64(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(input)
}

/// Parse `<name>:<n>`
fn sized<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, usize> {
    preceded(pair(tag(name), char(':')), parse_usize)
}

/// Parse `gnp:<n>:<p>` with an optional `:<seed>`
fn parse_gnp(input: &str) -> IResult<&str, Family> {
    map(
        tuple((
            sized("gnp"),
            preceded(char(':'), double),
            opt(preceded(char(':'), parse_u64)),
        )),
        |(n, p, seed)| Family::Gnp {
            n,
            p,
            seed: seed.unwrap_or(0),
        },
    )(input)
}

fn parse_family_inner(input: &str) -> IResult<&str, Family> {
    alt((
        map(sized("path"), Family::Path),
        map(sized("cycle"), Family::Cycle),
        map(sized("clique"), Family::Clique),
        map(sized("star"), Family::Star),
        map(sized("empty"), Family::Edgeless),
        map(
            separated_pair(sized("bipartite"), char(':'), parse_usize),
            |(a, b)| Family::CompleteBipartite(a, b),
        ),
        parse_gnp,
    ))(input)
}

/// Parse a family descriptor such as `cycle:4`, `bipartite:2:3` or
/// `gnp:10:0.3:7`.
pub fn parse_family(input: &str) -> Result<Family, HomError> {
    let family = match all_consuming(delimited(space0, parse_family_inner, space0))(input) {
        Ok((_, family)) => family,
        Err(e) => {
            return Err(HomError::InvalidFamily(format!(
                "cannot parse {:?}: {}",
                input, e
            )))
        }
    };
    family.check()?;
    Ok(family)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sized_families() {
        assert_eq!(parse_family("path:5"), Ok(Family::Path(5)));
        assert_eq!(parse_family("cycle:4"), Ok(Family::Cycle(4)));
        assert_eq!(parse_family("clique:5"), Ok(Family::Clique(5)));
        assert_eq!(parse_family("star:3"), Ok(Family::Star(3)));
        assert_eq!(parse_family(" empty:2 "), Ok(Family::Edgeless(2)));
        assert_eq!(parse_family("bipartite:2:3"), Ok(Family::CompleteBipartite(2, 3)));
    }

    #[test]
    fn test_parse_gnp() {
        assert_eq!(
            parse_family("gnp:10:0.25:7"),
            Ok(Family::Gnp { n: 10, p: 0.25, seed: 7 })
        );
        assert_eq!(
            parse_family("gnp:4:1"),
            Ok(Family::Gnp { n: 4, p: 1.0, seed: 0 })
        );
    }

    #[test]
    fn test_parse_errors() {
        for input in ["", "cycle", "cycle:", "cycle:x", "clique:3:4", "torus:3", "bipartite:2"] {
            assert!(
                matches!(parse_family(input), Err(HomError::InvalidFamily(_))),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_parameters() {
        assert!(parse_family("cycle:2").is_err());
        assert!(parse_family("gnp:5:2.5").is_err());
        assert!(matches!(
            parse_family("star:18446744073709551615"),
            Err(HomError::InvalidFamily(_))
        ));
    }

    #[test]
    fn test_display_output_parses_back() {
        for family in [
            Family::Star(7),
            Family::CompleteBipartite(1, 4),
            Family::Gnp { n: 6, p: 0.5, seed: 3 },
        ] {
            assert_eq!(parse_family(&family.to_string()), Ok(family));
        }
    }
}
